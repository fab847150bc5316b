//! End-to-end test: UNSTORED -> STORED -> SEALED lifecycle of nodes.

use provenance_graph::{Node, NodeState, ProvenanceError};
use provenance_tests::new_graph;
use provenance_types::{KeyError, LinkType, NodeType};
use serde_json::json;

#[test]
fn attribute_rules_follow_lifecycle() {
    let mut graph = new_graph();
    let job = graph.create(NodeType::CalcJob).unwrap();

    assert!(matches!(
        graph.set_attribute(job, "bad.key", 1),
        Err(ProvenanceError::InvalidKey(KeyError::ReservedSeparator(_)))
    ));
    assert!(matches!(
        graph.set_attribute(job, "nested", json!({"bad.key": 1})),
        Err(ProvenanceError::InvalidKey(_))
    ));
    graph.set_attribute(job, "parser", "core.arithmetic").unwrap();
    assert_eq!(graph.node(job).unwrap().state(), NodeState::Unstored);

    graph.store(job).unwrap();
    assert_eq!(graph.node(job).unwrap().state(), NodeState::Stored);
    graph.set_attribute(job, "state", "X").unwrap();
    assert!(matches!(
        graph.set_attribute(job, "other", "X"),
        Err(ProvenanceError::ModificationNotAllowed(_))
    ));
    assert!(matches!(
        graph.delete_attribute(job, "parser"),
        Err(ProvenanceError::ModificationNotAllowed(_))
    ));
    assert!(graph.set_extra(job, "bad.key", 1).is_err());
    graph.set_extra(job, "note", "kept").unwrap();

    graph.seal(job).unwrap();
    assert_eq!(graph.node(job).unwrap().state(), NodeState::Sealed);
    assert!(matches!(
        graph.set_attribute(job, "state", "Y"),
        Err(ProvenanceError::ModificationNotAllowed(_))
    ));
    graph.set_extra(job, "note", "still mutable").unwrap();
    assert_eq!(
        graph.node(job).unwrap().get_extra("note").unwrap(),
        &json!("still mutable")
    );
    assert!(matches!(
        graph.node(job).unwrap().get_attribute("missing"),
        Err(ProvenanceError::MissingKey(_))
    ));
}

#[test]
fn data_nodes_have_no_updatable_attributes() {
    let mut graph = new_graph();
    let data = graph
        .add(Node::builder(NodeType::Data).attribute("value", 1))
        .unwrap();
    graph.store(data).unwrap();
    assert!(matches!(
        graph.set_attribute(data, "process_state", "finished"),
        Err(ProvenanceError::ModificationNotAllowed(_))
    ));
    assert!(matches!(graph.seal(data), Err(ProvenanceError::TypeMismatch(_))));
}

#[test]
fn deep_unstored_chain_stored_in_order() {
    let mut graph = new_graph();
    let mut data = graph.create(NodeType::Data).unwrap();
    let first = data;
    for step in 0..200 {
        let calc = graph
            .add(Node::builder(NodeType::CalcFunction).attribute("step", step))
            .unwrap();
        graph.add_incoming(calc, data, LinkType::InputCalc, "x").unwrap();
        data = graph.create(NodeType::Data).unwrap();
        graph.add_incoming(data, calc, LinkType::Create, "result").unwrap();
    }

    graph.store(data).unwrap();
    let first_pk = graph.node(first).unwrap().pk().unwrap();
    let last_pk = graph.node(data).unwrap().pk().unwrap();
    assert!(first_pk < last_pk);
    assert!(graph.handles().iter().all(|h| graph.node(*h).unwrap().is_stored()));
}

#[test]
fn node_owner_comes_from_profile() {
    let mut graph = new_graph();
    let data = graph.create(NodeType::Data).unwrap();
    assert_eq!(
        graph.node(data).unwrap().user_email(),
        graph.profile().default_user_email
    );
    let other = graph
        .add(Node::builder(NodeType::Data).user_email("bob@example.org"))
        .unwrap();
    graph.store(other).unwrap();
    assert_eq!(graph.node(other).unwrap().user_email(), "bob@example.org");
}

#[test]
fn repository_frozen_after_store() {
    let mut graph = new_graph();
    let data = graph.create(NodeType::Data).unwrap();
    assert!(matches!(
        graph.put_object(data, "../escape", b"x".to_vec()),
        Err(ProvenanceError::InvalidValue(_))
    ));
    graph.put_object(data, "a.txt", b"a".to_vec()).unwrap();
    graph.store(data).unwrap();
    assert_eq!(
        graph.node(data).unwrap().repository().paths().collect::<Vec<_>>(),
        ["a.txt"]
    );
    assert!(matches!(
        graph.put_object(data, "b.txt", b"b".to_vec()),
        Err(ProvenanceError::ModificationNotAllowed(_))
    ));
}
