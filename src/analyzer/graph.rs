use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::PipelineError;
use crate::types::ParsedClass;

/// Parsed classes whose relations only point at other classes of the
/// same repository, with incoming degrees filled in.
#[derive(Debug, Clone)]
pub struct ClassGraph {
    classes: Vec<ParsedClass>,
    repo_classes: BTreeSet<String>,
}

impl ClassGraph {
    /// Classes in discovery order, one per analyzed file.
    pub fn classes(&self) -> &[ParsedClass] {
        &self.classes
    }

    /// The repository class set.
    pub fn repo_classes(&self) -> &BTreeSet<String> {
        &self.repo_classes
    }

    /// Checks that every relation target is a repository class other than
    /// the class itself.
    pub fn verify(&self) -> Result<(), PipelineError> {
        for class in &self.classes {
            for target in class.all_outgoing() {
                if !self.repo_classes.contains(target) {
                    return Err(PipelineError::Internal(format!(
                        "relation target '{}' of '{}' is not a repository class",
                        target, class.class_name
                    )));
                }
            }
            let self_reference = class.parent.as_deref() == Some(class.class_name.as_str())
                || [
                    &class.implements,
                    &class.compositions,
                    &class.aggregations,
                    &class.associations,
                    &class.dependencies,
                ]
                .iter()
                .any(|set| set.contains(&class.class_name));
            if self_reference {
                return Err(PipelineError::Internal(format!(
                    "class '{}' references itself",
                    class.class_name
                )));
            }
        }
        Ok(())
    }
}

/// Restricts relations to the repository class set and tallies incoming
/// degree per class name.
///
/// Files sharing a class name form one node: the first occurrence decides
/// the kind flags, and a dependent is counted once per distinct name.
pub fn build_graph(parsed: Vec<ParsedClass>) -> Result<ClassGraph, PipelineError> {
    let repo_classes: BTreeSet<String> = parsed.iter().map(|c| c.class_name.clone()).collect();

    let mut first_flags: HashMap<String, (bool, bool)> = HashMap::new();
    for class in &parsed {
        first_flags
            .entry(class.class_name.clone())
            .or_insert((class.is_interface, class.is_abstract));
    }

    let mut classes = parsed;
    for class in &mut classes {
        if let Some(&(is_interface, is_abstract)) = first_flags.get(&class.class_name) {
            class.is_interface = is_interface;
            class.is_abstract = is_abstract;
        }
        restrict(class, &repo_classes);
    }

    // target name -> distinct source names
    let mut dependents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for class in &classes {
        for target in class.all_outgoing() {
            dependents
                .entry(target)
                .or_default()
                .insert(class.class_name.as_str());
        }
    }
    let incoming: HashMap<String, usize> = dependents
        .into_iter()
        .map(|(target, sources)| (target.to_string(), sources.len()))
        .collect();

    for class in &mut classes {
        class.incoming_count = incoming.get(&class.class_name).copied().unwrap_or(0);
    }

    let graph = ClassGraph {
        classes,
        repo_classes,
    };
    graph.verify()?;

    tracing::debug!(
        "Class graph: {} classes, {} distinct names",
        graph.classes.len(),
        graph.repo_classes.len()
    );
    Ok(graph)
}

fn restrict(class: &mut ParsedClass, repo_classes: &BTreeSet<String>) {
    let own = class.class_name.clone();
    let keep = |name: &String| *name != own && repo_classes.contains(name);

    class.parent = class.parent.take().filter(|p| keep(p));
    class.implements.retain(keep);
    class.compositions.retain(keep);
    class.aggregations.retain(keep);
    class.associations.retain(keep);
    class.dependencies.retain(keep);
}
