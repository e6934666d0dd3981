use crate::analyzer::graph::ClassGraph;
use crate::types::{DiaDatum, ParsedClass};

/// Abstractness, instability and distance from the main sequence for one
/// class of the graph.
pub fn dia_for_class(class: &ParsedClass) -> DiaDatum {
    let incoming = class.incoming_count;
    let outgoing = class.all_outgoing().len();

    let abstractness = if class.is_abstraction() { 1.0 } else { 0.0 };
    let total = incoming + outgoing;
    let instability = if total > 0 {
        outgoing as f64 / total as f64
    } else {
        0.0
    };
    let distance = (abstractness + instability - 1.0).abs();

    DiaDatum {
        path: class.path.clone(),
        abstractness,
        instability,
        distance,
        incoming,
        outgoing,
    }
}

/// One datum per analyzed file, in discovery order.
pub fn calculate_dia(graph: &ClassGraph) -> Vec<DiaDatum> {
    graph.classes().iter().map(dia_for_class).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::build_graph;

    #[test]
    fn test_isolated_concrete_class() {
        let datum = dia_for_class(&ParsedClass::new("A.java", "A"));
        assert_eq!(datum.abstractness, 0.0);
        assert_eq!(datum.instability, 0.0);
        assert_eq!(datum.distance, 1.0);
        assert_eq!((datum.incoming, datum.outgoing), (0, 0));
    }

    #[test]
    fn test_isolated_interface_sits_on_main_sequence() {
        let mut iface = ParsedClass::new("I.java", "I");
        iface.is_interface = true;
        let datum = dia_for_class(&iface);
        assert_eq!(datum.abstractness, 1.0);
        assert_eq!(datum.instability, 0.0);
        assert_eq!(datum.distance, 0.0);
    }

    #[test]
    fn test_mixed_coupling() {
        let mut a = ParsedClass::new("A.java", "A");
        a.dependencies.insert("B".to_string());
        let mut b = ParsedClass::new("B.java", "B");
        b.is_abstract = true;
        b.associations.insert("C".to_string());
        b.compositions.insert("D".to_string());
        let c = ParsedClass::new("C.java", "C");
        let d = ParsedClass::new("D.java", "D");

        let graph = build_graph(vec![a, b, c, d]).unwrap();
        let dia = calculate_dia(&graph);
        let b = &dia[1];
        assert_eq!((b.incoming, b.outgoing), (1, 2));
        assert!((b.instability - 2.0 / 3.0).abs() < 1e-12);
        assert!((b.distance - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(b.path, "B.java");
    }
}
