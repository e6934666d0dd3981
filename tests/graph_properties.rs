use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;

use repolens::analyzer::uml::parse_edge_line;
use repolens::analyzer::{RelationKind, build_graph, build_uml, calculate_dia};
use repolens::types::ParsedClass;

const NAMES: [&str; 8] = ["A", "B", "C", "D", "E", "String", "List", "Object"];

fn names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(prop::sample::select(NAMES.to_vec()).prop_map(str::to_string), 0..4)
}

fn class(index: usize) -> impl Strategy<Value = ParsedClass> {
    // Index 5 reuses "A" to exercise class-name collisions
    let name = ["A", "B", "C", "D", "E", "A"][index];
    (
        any::<bool>(),
        any::<bool>(),
        prop::option::of(prop::sample::select(NAMES.to_vec())),
        (names(), names(), names(), names(), names()),
    )
        .prop_map(move |(is_interface, is_abstract, parent, sets)| {
            let mut class = ParsedClass::new(format!("pkg{}/{}.java", index, name), name);
            class.is_interface = is_interface;
            class.is_abstract = is_abstract;
            class.parent = parent.map(str::to_string);
            (
                class.implements,
                class.compositions,
                class.aggregations,
                class.associations,
                class.dependencies,
            ) = sets;
            class
        })
}

/// Every relation kind `class` holds towards `target`.
fn kinds_towards(class: &ParsedClass, target: &str) -> Vec<RelationKind> {
    let mut kinds = Vec::new();
    if class.implements.contains(target) {
        kinds.push(RelationKind::Implements);
    }
    if class.parent.as_deref() == Some(target) {
        kinds.push(RelationKind::Extends);
    }
    if class.compositions.contains(target) {
        kinds.push(RelationKind::Composition);
    }
    if class.aggregations.contains(target) {
        kinds.push(RelationKind::Aggregation);
    }
    if class.associations.contains(target) {
        kinds.push(RelationKind::Association);
    }
    if class.dependencies.contains(target) {
        kinds.push(RelationKind::Dependency);
    }
    kinds
}

fn classes() -> impl Strategy<Value = Vec<ParsedClass>> {
    (1..=6usize).prop_flat_map(|n| (0..n).map(class).collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn dia_metrics_stay_in_range(parsed in classes()) {
        let graph = build_graph(parsed).unwrap();
        for datum in calculate_dia(&graph) {
            prop_assert!((0.0..=1.0).contains(&datum.instability));
            prop_assert!(datum.abstractness == 0.0 || datum.abstractness == 1.0);
            prop_assert!((datum.distance - (datum.abstractness + datum.instability - 1.0).abs()).abs() < 1e-12);
            prop_assert!((0.0..=1.0).contains(&datum.distance));
        }
    }

    #[test]
    fn relations_stay_inside_repository(parsed in classes()) {
        let graph = build_graph(parsed).unwrap();
        for class in graph.classes() {
            for target in class.all_outgoing() {
                prop_assert!(graph.repo_classes().contains(target));
                prop_assert_ne!(target, class.class_name.as_str());
            }
        }
    }

    #[test]
    fn uml_declares_each_class_once_and_pairs_once(parsed in classes()) {
        let graph = build_graph(parsed).unwrap();
        let uml = build_uml(&graph);

        let declarations: Vec<&str> = uml
            .body_lines()
            .filter(|line| parse_edge_line(line).is_none())
            .collect();
        prop_assert_eq!(declarations.len(), graph.repo_classes().len());

        let mut pairs = HashSet::new();
        for (source, _, target) in uml.body_lines().filter_map(parse_edge_line) {
            prop_assert_ne!(source, target);
            prop_assert!(pairs.insert((source, target)));
        }
    }

    #[test]
    fn graph_building_is_deterministic(parsed in classes()) {
        let first = build_uml(&build_graph(parsed.clone()).unwrap());
        let second = build_uml(&build_graph(parsed).unwrap());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn each_edge_carries_the_strongest_relation(parsed in classes()) {
        let graph = build_graph(parsed).unwrap();
        let uml = build_uml(&graph);

        let edges: HashSet<(&str, RelationKind, &str)> =
            uml.body_lines().filter_map(parse_edge_line).collect();
        for &(source, kind, target) in &edges {
            let strongest = graph
                .classes()
                .iter()
                .filter(|class| class.class_name == source)
                .flat_map(|class| kinds_towards(class, target))
                .min();
            prop_assert_eq!(strongest, Some(kind), "{} -> {}", source, target);
        }

        // Every related pair shows up as an edge
        for class in graph.classes() {
            for target in class.all_outgoing() {
                prop_assert!(edges
                    .iter()
                    .any(|&(s, _, t)| s == class.class_name && t == target));
            }
        }
    }
}
