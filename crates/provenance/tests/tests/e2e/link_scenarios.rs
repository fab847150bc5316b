//! End-to-end test: link attachment, cardinality and link queries.

use provenance_graph::{NestedLinks, ProvenanceError};
use provenance_store::LinkFilter;
use provenance_tests::{finished, new_graph};
use provenance_types::{LinkType, NodeType};

// ---------------------------------------------------------------------------
// Cardinality scenarios
// ---------------------------------------------------------------------------

#[test]
fn data_has_a_single_creator() {
    let mut graph = new_graph();
    let data = graph.create(NodeType::Data).unwrap();
    let calc = graph.create(NodeType::CalcJob).unwrap();
    let calc2 = graph.create(NodeType::CalcJob).unwrap();

    graph
        .add_incoming(data, calc, LinkType::Create, "create")
        .unwrap();
    let err = graph
        .add_incoming(data, calc2, LinkType::Create, "create")
        .unwrap_err();
    assert!(matches!(err, ProvenanceError::InvalidValue(_)));
    assert!(err.to_string().contains("indegree"));

    // Still one creator once everything is stored.
    graph.store(data).unwrap();
    let err = graph
        .add_incoming(data, calc2, LinkType::Create, "other")
        .unwrap_err();
    assert!(matches!(err, ProvenanceError::InvalidValue(_)));
    assert!(!graph.node(calc2).unwrap().is_stored());
}

#[test]
fn process_has_a_single_caller() {
    let mut graph = new_graph();
    let called = graph.create(NodeType::CalcFunction).unwrap();
    let caller_a = graph.create(NodeType::WorkChain).unwrap();
    let caller_b = graph.create(NodeType::WorkFunction).unwrap();

    graph
        .add_incoming(called, caller_a, LinkType::CallCalc, "call")
        .unwrap();
    assert!(matches!(
        graph.add_incoming(called, caller_b, LinkType::CallCalc, "call"),
        Err(ProvenanceError::InvalidValue(_))
    ));
    assert!(matches!(
        graph.add_incoming(called, caller_b, LinkType::CallCalc, "other"),
        Err(ProvenanceError::InvalidValue(_))
    ));
}

#[test]
fn input_labels_unique_per_target() {
    let mut graph = new_graph();
    let calc = graph.create(NodeType::CalcJob).unwrap();
    let x1 = graph.create(NodeType::Data).unwrap();
    let x2 = graph.create(NodeType::Data).unwrap();

    graph.add_incoming(calc, x1, LinkType::InputCalc, "x").unwrap();
    assert!(matches!(
        graph.add_incoming(calc, x2, LinkType::InputCalc, "x"),
        Err(ProvenanceError::InvalidValue(_))
    ));
    graph.add_incoming(calc, x2, LinkType::InputCalc, "y").unwrap();

    // One data node may feed many calculations under the same label.
    let other = graph.create(NodeType::CalcJob).unwrap();
    graph.add_incoming(other, x1, LinkType::InputCalc, "x").unwrap();
    assert_eq!(graph.get_outgoing(x1, &[]).unwrap().len(), 2);
}

#[test]
fn return_requires_stored_data() {
    let mut graph = new_graph();
    let work = graph.create(NodeType::WorkChain).unwrap();
    let data = graph.create(NodeType::Data).unwrap();
    assert!(matches!(
        graph.add_incoming(data, work, LinkType::Return, "result"),
        Err(ProvenanceError::InvalidValue(_))
    ));

    graph.store(data).unwrap();
    graph.add_incoming(data, work, LinkType::Return, "result").unwrap();
    assert!(graph.node(work).unwrap().is_stored());

    // The same data may be returned twice under different labels.
    graph.add_incoming(data, work, LinkType::Return, "alias").unwrap();
    let returned = graph.get_outgoing(work, &[LinkType::Return]).unwrap();
    assert_eq!(returned.all_link_labels(), ["result", "alias"]);
}

#[test]
fn wrong_type_pair_and_bad_label_rejected() {
    let mut graph = new_graph();
    let data = graph.create(NodeType::Data).unwrap();
    let work = graph.create(NodeType::WorkChain).unwrap();
    let calc = graph.create(NodeType::CalcJob).unwrap();

    assert!(matches!(
        graph.add_incoming(data, work, LinkType::Create, "result"),
        Err(ProvenanceError::InvalidValue(_))
    ));
    for label in ["", "1st", "a-b", "a___b", "__a"] {
        let err = graph
            .add_incoming(calc, data, LinkType::InputCalc, label)
            .unwrap_err();
        assert!(err.to_string().contains("invalid link label"), "{label}: {err}");
    }
}

#[test]
fn links_across_graph_sessions_share_constraints() {
    let mut graph = new_graph();
    let data = graph.create(NodeType::Data).unwrap();
    let calc = graph.create(NodeType::CalcJob).unwrap();
    graph.add_incoming(data, calc, LinkType::Create, "result").unwrap();
    graph.store(data).unwrap();
    let uuid = graph.node(data).unwrap().uuid();

    let mut other = provenance_tests::graph_on(
        graph.backend().clone(),
        provenance_graph::CachingConfig::disabled(),
    );
    let loaded = other.load(uuid).unwrap();
    let rival = other.create(NodeType::CalcFunction).unwrap();
    assert!(matches!(
        other.add_incoming(loaded, rival, LinkType::Create, "result"),
        Err(ProvenanceError::InvalidValue(_))
    ));
}

// ---------------------------------------------------------------------------
// Link queries
// ---------------------------------------------------------------------------

#[test]
fn nested_inputs_rebuilt_from_flat_labels() {
    let mut graph = new_graph();
    let calc = finished(&mut graph, NodeType::CalcJob);
    for label in ["code", "parameters__kpoints", "parameters__cutoff"] {
        let data = graph.create(NodeType::Data).unwrap();
        graph
            .add_incoming(calc, data, LinkType::InputCalc, label)
            .unwrap();
    }
    graph.store(calc).unwrap();

    let inputs = graph.get_incoming(calc, &[LinkType::InputCalc]).unwrap();
    let nested = inputs.nested(true).unwrap();
    assert_eq!(nested.keys(), ["code", "parameters"]);
    let parameters = nested.get("parameters").unwrap();
    assert_eq!(parameters.keys(), ["cutoff", "kpoints"]);
    assert!(matches!(parameters, NestedLinks::Namespace(_)));
    assert_eq!(
        parameters.get("kpoints").and_then(NestedLinks::as_node),
        Some(inputs.get_node_by_label("parameters__kpoints").unwrap())
    );

    assert!(matches!(inputs.one(), Err(ProvenanceError::InvalidValue(_))));
    assert!(matches!(
        inputs.get_node_by_label("missing"),
        Err(ProvenanceError::NotExistent(_))
    ));

    let pk = graph.node(calc).unwrap().pk().unwrap();
    let rows = graph.backend().query_links(&LinkFilter::incoming(pk)).unwrap();
    assert_eq!(rows.len(), 3);
}
