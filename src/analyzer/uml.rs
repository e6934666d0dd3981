use std::collections::HashSet;
use std::fmt::Write as _;

use serde::Serialize;

use crate::analyzer::graph::ClassGraph;
use crate::types::{ParsedClass, UmlDocument};

/// Relation kinds in emission precedence, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Implements,
    Extends,
    Composition,
    Aggregation,
    Association,
    Dependency,
}

impl RelationKind {
    pub const PRECEDENCE: [RelationKind; 6] = [
        RelationKind::Implements,
        RelationKind::Extends,
        RelationKind::Composition,
        RelationKind::Aggregation,
        RelationKind::Association,
        RelationKind::Dependency,
    ];

    /// PlantUML arrow token
    pub fn arrow(self) -> &'static str {
        match self {
            RelationKind::Implements => "..|>",
            RelationKind::Extends => "--|>",
            RelationKind::Composition => "*--",
            RelationKind::Aggregation => "o--",
            RelationKind::Association => "-->",
            RelationKind::Dependency => "..>",
        }
    }

    pub fn from_arrow(arrow: &str) -> Option<Self> {
        Self::PRECEDENCE.into_iter().find(|kind| kind.arrow() == arrow)
    }

    /// Targets of this kind for `class`, in deterministic order.
    fn targets(self, class: &ParsedClass) -> Box<dyn Iterator<Item = &str> + '_> {
        let set = match self {
            RelationKind::Extends => return Box::new(class.parent.as_deref().into_iter()),
            RelationKind::Implements => &class.implements,
            RelationKind::Composition => &class.compositions,
            RelationKind::Aggregation => &class.aggregations,
            RelationKind::Association => &class.associations,
            RelationKind::Dependency => &class.dependencies,
        };
        Box::new(set.iter().map(String::as_str))
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelationKind::Implements => "implements",
            RelationKind::Extends => "extends",
            RelationKind::Composition => "composition",
            RelationKind::Aggregation => "aggregation",
            RelationKind::Association => "association",
            RelationKind::Dependency => "dependency",
        };
        f.write_str(name)
    }
}

fn declaration(class: &ParsedClass) -> String {
    if class.is_interface {
        format!("interface {}", class.class_name)
    } else if class.is_abstract {
        format!("abstract class {}", class.class_name)
    } else {
        format!("class {}", class.class_name)
    }
}

/// Renders the graph as a PlantUML class diagram.
///
/// Each class name is declared once, in discovery order. Each ordered
/// pair of classes gets at most one edge: the strongest relation kind
/// that holds between them.
pub fn build_uml(graph: &ClassGraph) -> UmlDocument {
    let classes = graph.classes();
    let mut text = String::new();
    text.push_str(UmlDocument::START);
    text.push('\n');

    let mut declared: HashSet<&str> = HashSet::new();
    for class in classes {
        if declared.insert(class.class_name.as_str()) {
            text.push_str(&declaration(class));
            text.push('\n');
        }
    }

    let mut emitted: HashSet<(&str, &str)> = HashSet::new();
    let mut edge_count = 0;
    for kind in RelationKind::PRECEDENCE {
        for class in classes {
            let source = class.class_name.as_str();
            for target in kind.targets(class) {
                if target == source || !emitted.insert((source, target)) {
                    continue;
                }
                // Writing into a String cannot fail
                let _ = writeln!(text, "{} {} {}", source, kind.arrow(), target);
                edge_count += 1;
            }
        }
    }

    text.push_str(UmlDocument::END);
    tracing::debug!(
        "Built UML diagram with {} declarations and {} relations",
        declared.len(),
        edge_count
    );
    UmlDocument::new(text)
}

/// Splits an edge line `<src> <arrow> <dst>` back into its parts.
pub fn parse_edge_line(line: &str) -> Option<(&str, RelationKind, &str)> {
    let mut parts = line.split_whitespace();
    let source = parts.next()?;
    let kind = RelationKind::from_arrow(parts.next()?)?;
    let target = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((source, kind, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::build_graph;

    fn class(name: &str) -> ParsedClass {
        ParsedClass::new(format!("{}.java", name), name)
    }

    #[test]
    fn test_declarations_by_kind() {
        let mut i = class("I");
        i.is_interface = true;
        let mut s = class("S");
        s.is_abstract = true;
        let graph = build_graph(vec![i, s, class("C")]).unwrap();
        assert_eq!(
            build_uml(&graph).as_str(),
            "@startuml\ninterface I\nabstract class S\nclass C\n@enduml"
        );
    }

    #[test]
    fn test_strongest_relation_wins_per_pair() {
        let mut a = class("A");
        a.parent = Some("B".to_string());
        a.associations.insert("B".to_string());
        a.compositions.insert("D".to_string());
        a.dependencies.insert("C".to_string());
        a.dependencies.insert("D".to_string());
        let graph = build_graph(vec![a, class("B"), class("C"), class("D")]).unwrap();

        let uml = build_uml(&graph);
        let edges: Vec<&str> = uml.body_lines().skip(4).collect();
        assert_eq!(edges, vec!["A --|> B", "A *-- D", "A ..> C"]);
    }

    #[test]
    fn test_weaker_kinds_never_duplicate_a_pair() {
        let mut a = class("A");
        a.implements.insert("B".to_string());
        a.associations.insert("B".to_string());
        a.compositions.insert("C".to_string());
        a.aggregations.insert("C".to_string());
        let mut c = class("C");
        c.parent = Some("A".to_string());
        c.dependencies.insert("A".to_string());
        let graph = build_graph(vec![a, class("B"), c]).unwrap();

        let uml = build_uml(&graph);
        let edges: Vec<&str> = uml.body_lines().skip(3).collect();
        assert_eq!(edges, vec!["A ..|> B", "C --|> A", "A *-- C"]);
    }

    #[test]
    fn test_reverse_pairs_are_independent() {
        let mut a = class("A");
        a.associations.insert("B".to_string());
        let mut b = class("B");
        b.dependencies.insert("A".to_string());
        let graph = build_graph(vec![a, b]).unwrap();
        let uml = build_uml(&graph);
        assert!(uml.as_str().contains("A --> B\n"));
        assert!(uml.as_str().contains("B ..> A\n"));
    }

    #[test]
    fn test_duplicate_names_declared_once() {
        let mut first = ParsedClass::new("a/Util.java", "Util");
        first.dependencies.insert("Log".to_string());
        let mut second = ParsedClass::new("b/Util.java", "Util");
        second.dependencies.insert("Log".to_string());
        let graph = build_graph(vec![first, second, class("Log")]).unwrap();
        assert_eq!(
            build_uml(&graph).as_str(),
            "@startuml\nclass Util\nclass Log\nUtil ..> Log\n@enduml"
        );
    }

    #[test]
    fn test_parse_edge_line() {
        assert_eq!(
            parse_edge_line("A o-- B"),
            Some(("A", RelationKind::Aggregation, "B"))
        );
        assert_eq!(parse_edge_line("class A"), None);
        assert_eq!(parse_edge_line("A <|-- B"), None);
    }
}
