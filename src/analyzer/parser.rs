//! Regex-level structural parser.
//!
//! This is a textual heuristic, not a language front-end: it looks at raw
//! lines and never tokenizes, so comments and string literals are scanned
//! like code.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

use crate::errors::PipelineError;
use crate::types::{ParsedClass, SourceFile};

lazy_static! {
    static ref RE_TYPE_NAME: Regex = Regex::new(r"\b([A-Z][A-Za-z0-9_]*)\b").unwrap();
    static ref RE_NEW_TYPE: Regex = Regex::new(r"\bnew\s+([A-Z][A-Za-z0-9_]*)\b").unwrap();
    // What may follow the type of a field: generics or brackets, a name, then `=` or `;`
    static ref RE_FIELD_TAIL: Regex =
        Regex::new(r"^(?:\s*<[^=;()]*>)?[\[\]>\s]*\s[A-Za-z_$][A-Za-z0-9_$]*\s*[=;]").unwrap();
    // What may follow a return type or constructor name: an optional name, then `(`
    static ref RE_SIGNATURE_TAIL: Regex =
        Regex::new(r"^(?:\s+[A-Za-z_$][A-Za-z0-9_$]*)?\s*\(").unwrap();
    static ref RE_GENERIC_ARGS: Regex = Regex::new(r"<[^<>]*>").unwrap();
    static ref RE_COMMENT: Regex = Regex::new(r"//[^\r\n]*|/\*(?s:.*?)\*/").unwrap();
}

/// Relation bucket of one identifier on one line, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LineRelation {
    Composition,
    Aggregation,
    Dependency,
    Association,
}

/// Patterns that mention the class being parsed.
struct DeclarationPatterns {
    interface: Regex,
    abstract_class: Regex,
    extends: Regex,
    implements: Regex,
}

impl DeclarationPatterns {
    fn for_class(class_name: &str) -> Result<Self, regex::Error> {
        let name = regex::escape(class_name);
        // Optional type parameters right after the declared name
        let header = format!(r"\bclass\s+{}\b(?:\s*<[^{{]*?>)?", name);
        Ok(Self {
            interface: Regex::new(&format!(r"\binterface\s+{}\b", name))?,
            abstract_class: Regex::new(&format!(r"\babstract\s+class\s+{}\b", name))?,
            extends: Regex::new(&format!(r"{}\s+extends\s+([A-Z][A-Za-z0-9_]*)", header))?,
            implements: Regex::new(&format!(
                r"{}(?:\s+extends\s+[^{{]*?)?\s+implements\s+([^{{]+)",
                header
            ))?,
        })
    }
}

/// Extracts kind flags, the extends target, the implements list and the
/// four relation buckets from one file.
///
/// Targets are not yet restricted to the repository; see
/// [`super::graph::build_graph`].
pub fn parse_class(file: &SourceFile) -> Result<ParsedClass, PipelineError> {
    let patterns = DeclarationPatterns::for_class(&file.class_name).map_err(|e| {
        PipelineError::Internal(format!(
            "cannot build patterns for class '{}': {}",
            file.class_name, e
        ))
    })?;

    let content = file.content.as_str();
    let mut parsed = ParsedClass::new(file.path.clone(), file.class_name.clone());
    parsed.is_interface = patterns.interface.is_match(content);
    parsed.is_abstract = patterns.abstract_class.is_match(content);
    parsed.parent = patterns
        .extends
        .captures(content)
        .map(|caps| caps[1].to_string());
    if let Some(caps) = patterns.implements.captures(content) {
        parsed.implements = split_type_list(&caps[1]);
    }

    for line in content.split(['\r', '\n']) {
        for (name, relation) in classify_line(line, &file.class_name) {
            let bucket = match relation {
                LineRelation::Composition => &mut parsed.compositions,
                LineRelation::Aggregation => &mut parsed.aggregations,
                LineRelation::Dependency => &mut parsed.dependencies,
                LineRelation::Association => &mut parsed.associations,
            };
            bucket.insert(name.to_string());
        }
    }

    Ok(parsed)
}

pub fn parse_classes(files: &[SourceFile]) -> Result<Vec<ParsedClass>, PipelineError> {
    files.iter().map(parse_class).collect()
}

/// Classifies every distinct capitalized identifier on `line`, skipping
/// `own_name`. Identifiers come back in order of first appearance.
fn classify_line<'a>(line: &'a str, own_name: &str) -> Vec<(&'a str, LineRelation)> {
    let created: BTreeSet<&str> = RE_NEW_TYPE
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    let mut seen: Vec<(&str, LineRelation)> = Vec::new();
    for m in RE_TYPE_NAME.find_iter(line) {
        let name = m.as_str();
        if name == own_name {
            continue;
        }
        let relation = if created.contains(name) {
            LineRelation::Composition
        } else if RE_FIELD_TAIL.is_match(&line[m.end()..]) {
            LineRelation::Aggregation
        } else if RE_SIGNATURE_TAIL.is_match(&line[m.end()..])
            || line[..m.start()].trim_end().ends_with('(')
        {
            LineRelation::Dependency
        } else {
            LineRelation::Association
        };

        // Several occurrences on one line: the strongest classification wins
        match seen.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => {
                if relation < entry.1 {
                    entry.1 = relation;
                }
            }
            None => seen.push((name, relation)),
        }
    }
    seen
}

/// Splits `A, pkg.B<T>, C` into simple type names.
fn split_type_list(list: &str) -> BTreeSet<String> {
    // Drop comments and generic arguments first so neither splits the list
    let mut flat = RE_COMMENT.replace_all(list, " ").into_owned();
    while RE_GENERIC_ARGS.is_match(&flat) {
        flat = RE_GENERIC_ARGS.replace_all(&flat, "").into_owned();
    }

    flat.split(',')
        .map(str::trim)
        .filter_map(|item| item.rsplit('.').next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, content: &str) -> ParsedClass {
        parse_class(&SourceFile::new(path, content).unwrap()).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_kind_flags() {
        assert!(parse("I.java", "public interface I {}").is_interface);
        assert!(parse("S.java", "abstract class S {}").is_abstract);

        let plain = parse("P.java", "class P { /* interface Other */ }");
        assert!(!plain.is_interface);
        assert!(!plain.is_abstract);

        // The name must match exactly, not as a prefix
        assert!(!parse("Shape.java", "interface Shapes {}").is_interface);
    }

    #[test]
    fn test_extends_and_implements() {
        let parsed = parse(
            "A.java",
            "public class A extends Base implements Runnable, java.io.Serializable, Comparable<A> {\n}",
        );
        assert_eq!(parsed.parent.as_deref(), Some("Base"));
        assert_eq!(parsed.implements, set(&["Comparable", "Runnable", "Serializable"]));
    }

    #[test]
    fn test_implements_without_extends_and_generic_header() {
        let parsed = parse("Box.java", "class Box<T>\n    implements Container<T>, Sized\n{\n}");
        assert_eq!(parsed.parent, None);
        assert_eq!(parsed.implements, set(&["Container", "Sized"]));
    }

    #[test]
    fn test_composition_beats_aggregation_on_same_line() {
        let parsed = parse("A.java", "class A { B b = new B(); }");
        assert_eq!(parsed.compositions, set(&["B"]));
        assert!(parsed.aggregations.is_empty());
    }

    #[test]
    fn test_single_line_mixed_relations() {
        let parsed = parse("A.java", "class A extends B { void f(C c) { new D(); } }");
        assert_eq!(parsed.parent.as_deref(), Some("B"));
        assert_eq!(parsed.compositions, set(&["D"]));
        assert_eq!(parsed.dependencies, set(&["C"]));
        assert_eq!(parsed.associations, set(&["B"]));
        assert!(parsed.aggregations.is_empty());
    }

    #[test]
    fn test_field_declarations_aggregate() {
        let parsed = parse(
            "Order.java",
            "class Order {\n    private Customer customer;\n    private List<Item> items = load();\n    Line[] lines;\n}",
        );
        assert!(parsed.aggregations.contains("Customer"));
        assert!(parsed.aggregations.contains("Item"));
        assert!(parsed.aggregations.contains("Line"));
        assert!(parsed.dependencies.is_empty());
    }

    #[test]
    fn test_signatures_depend() {
        let parsed = parse(
            "Service.java",
            "class Service {\n    public Report build(Request req) {\n        return null;\n    }\n}",
        );
        assert_eq!(parsed.dependencies, set(&["Report", "Request"]));
    }

    #[test]
    fn test_other_mentions_associate() {
        let parsed = parse("A.java", "class A {\n    int x = Util.max();\n}");
        assert_eq!(parsed.associations, set(&["Util"]));
    }

    #[test]
    fn test_buckets_accumulate_across_lines() {
        let parsed = parse(
            "A.java",
            "class A {\n    B field;\n    void f(B arg) {}\n    Object o = new B();\n}",
        );
        assert!(parsed.aggregations.contains("B"));
        assert!(parsed.dependencies.contains("B"));
        assert!(parsed.compositions.contains("B"));
    }

    #[test]
    fn test_own_name_never_collected() {
        let parsed = parse("Node.java", "class Node {\n    Node next;\n    Node copy() { return new Node(); }\n}");
        assert!(parsed.all_outgoing().is_empty());
    }

    #[test]
    fn test_comments_inside_implements_clause() {
        let parsed = parse(
            "A.java",
            "class A implements I // marker only
{
}",
        );
        assert_eq!(parsed.implements, set(&["I"]));

        let parsed = parse("B.java", "class B implements /* first */ I, J /* last */ {}");
        assert_eq!(parsed.implements, set(&["I", "J"]));
    }

    #[test]
    fn test_split_type_list() {
        assert_eq!(
            split_type_list(" Map<K, Map<V, W>>, a.b.C ,, D "),
            set(&["C", "D", "Map"])
        );
    }
}
