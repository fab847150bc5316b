//! End-to-end test: equivalent nodes are taken from the cache.

use provenance_graph::{CachingConfig, ConfigError, Node, ProvenanceError, RepositoryFile};
use provenance_store::InMemoryBackend;
use provenance_tests::{caching_graph, finished, graph_on, new_graph};
use provenance_types::{LinkType, NodeType};
use serde_json::json;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn add_process(
    graph: &mut provenance_graph::ProvenanceGraph,
    process_type: &str,
) -> provenance_graph::NodeHandle {
    graph
        .add(
            Node::builder(NodeType::CalcFunction)
                .process_type(process_type)
                .attribute("process_state", "finished"),
        )
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn data_round_trip() {
    let mut graph = caching_graph();
    let a = graph
        .add(
            Node::builder(NodeType::Data)
                .attribute("value", json!({"x": [1, 2.5, "three"]}))
                .file("input.txt", b"payload".to_vec()),
        )
        .unwrap();
    graph.store(a).unwrap();

    let b = graph
        .add(
            Node::builder(NodeType::Data)
                .attribute("value", json!({"x": [1, 2.5, "three"]}))
                .file("input.txt", b"payload".to_vec()),
        )
        .unwrap();
    graph.store(b).unwrap();

    let a_uuid = graph.node(a).unwrap().uuid();
    assert_eq!(graph.get_cache_source(b).unwrap(), Some(a_uuid));
    assert_eq!(graph.get_hash(a).unwrap(), graph.get_hash(b).unwrap());
    assert_eq!(
        graph.node(a).unwrap().repository().get("input.txt"),
        graph.node(b).unwrap().repository().get("input.txt")
    );
    assert!(matches!(
        graph.node(b).unwrap().repository().get("input.txt"),
        Some(RepositoryFile::Stored { .. })
    ));
    assert_eq!(graph.get_object_content(b, "input.txt").unwrap(), b"payload");
}

#[test]
fn different_content_misses() {
    let mut graph = caching_graph();
    let a = graph
        .add(Node::builder(NodeType::Data).attribute("value", 1))
        .unwrap();
    graph.store(a).unwrap();
    let b = graph
        .add(Node::builder(NodeType::Data).attribute("value", 1.0))
        .unwrap();
    graph.store(b).unwrap();
    assert!(graph.get_cache_source(b).unwrap().is_none());
}

#[test]
fn calculation_clone_takes_over_outputs_and_extras() {
    let mut graph = caching_graph();
    let x = graph
        .add(Node::builder(NodeType::Data).attribute("value", 4))
        .unwrap();

    let original = graph
        .add(
            Node::builder(NodeType::CalcJob)
                .label("square")
                .attribute("process_state", "finished")
                .attribute("queue_name", "fast")
                .extra("tag", "first")
                .extra("shared", 1),
        )
        .unwrap();
    graph
        .add_incoming(original, x, LinkType::InputCalc, "x")
        .unwrap();
    let result = graph
        .add(Node::builder(NodeType::Data).attribute("value", 16))
        .unwrap();
    graph
        .add_incoming(result, original, LinkType::Create, "result")
        .unwrap();
    graph.store(result).unwrap();
    graph.seal(original).unwrap();

    // Scheduler options do not change what the job computes.
    let rerun = graph
        .add(
            Node::builder(NodeType::CalcJob)
                .attribute("queue_name", "slow")
                .extra("shared", 2),
        )
        .unwrap();
    graph.add_incoming(rerun, x, LinkType::InputCalc, "x").unwrap();
    graph.store(rerun).unwrap();

    let node = graph.node(rerun).unwrap();
    assert_eq!(node.cache_source(), Some(graph.node(original).unwrap().uuid()));
    assert_eq!(node.label(), "square");
    assert!(node.is_sealed());
    assert_eq!(node.get_attribute("queue_name").unwrap(), &json!("fast"));
    assert_eq!(node.get_extra("tag").unwrap(), &json!("first"));
    assert_eq!(node.get_extra("shared").unwrap(), &json!(2));

    let outputs = graph.get_outgoing(rerun, &[LinkType::Create]).unwrap();
    let clone = outputs.one().unwrap().node;
    assert_ne!(clone, result);
    assert_eq!(
        graph.node(clone).unwrap().get_attribute("value").unwrap(),
        &json!(16)
    );
    assert_eq!(graph.get_hash(clone).unwrap(), graph.get_hash(result).unwrap());
    assert_eq!(graph.get_incoming(rerun, &[]).unwrap().len(), 1);
}

#[test]
fn unusable_sources_skipped() {
    let mut graph = caching_graph();

    // Not finished.
    let running = graph.create(NodeType::CalcFunction).unwrap();
    graph.store(running).unwrap();
    let twin = graph.create(NodeType::CalcFunction).unwrap();
    graph.store(twin).unwrap();
    assert!(graph.get_cache_source(twin).unwrap().is_none());

    // Workflows neither use nor provide cache entries.
    let work = finished(&mut graph, NodeType::WorkChain);
    graph.store(work).unwrap();
    let work_twin = finished(&mut graph, NodeType::WorkChain);
    graph.store(work_twin).unwrap();
    assert!(graph.get_cache_source(work_twin).unwrap().is_none());

    // Hash cleared.
    let cleared = graph
        .add(Node::builder(NodeType::Data).attribute("value", "cleared"))
        .unwrap();
    graph.store(cleared).unwrap();
    graph.clear_hash(cleared).unwrap();
    let again = graph
        .add(Node::builder(NodeType::Data).attribute("value", "cleared"))
        .unwrap();
    graph.store(again).unwrap();
    assert!(graph.get_cache_source(again).unwrap().is_none());

    // Opted out after storing.
    let opted = graph
        .add(Node::builder(NodeType::Data).attribute("value", "opted"))
        .unwrap();
    graph.store(opted).unwrap();
    graph.set_valid_cache(opted, false).unwrap();
    let again = graph
        .add(Node::builder(NodeType::Data).attribute("value", "opted"))
        .unwrap();
    graph.store(again).unwrap();
    assert!(graph.get_cache_source(again).unwrap().is_none());
}

#[test]
fn caching_resolved_per_identifier() {
    let caching = CachingConfig::disabled()
        .enable_for("arithmetic.*")
        .disable_for("arithmetic.slow");
    let mut graph = graph_on(Arc::new(InMemoryBackend::default()), caching);

    for (process_type, hit) in [("arithmetic.add", true), ("arithmetic.slow", false), ("other", false)] {
        let first = add_process(&mut graph, process_type);
        graph.store(first).unwrap();
        let second = add_process(&mut graph, process_type);
        graph.store(second).unwrap();
        assert_eq!(
            graph.get_cache_source(second).unwrap().is_some(),
            hit,
            "{process_type}"
        );
    }
}

#[test]
fn ambiguous_caching_aborts_store() {
    let caching = CachingConfig::disabled()
        .enable_for("arithmetic.*")
        .disable_for("*.add");
    let mut graph = graph_on(Arc::new(InMemoryBackend::default()), caching);
    let node = add_process(&mut graph, "arithmetic.add");
    let err = graph.store(node).unwrap_err();
    assert!(matches!(
        err,
        ProvenanceError::Config(ConfigError::AmbiguousCaching { .. })
    ));
    assert!(!graph.node(node).unwrap().is_stored());
}

#[test]
fn caching_off_by_default() {
    let mut graph = new_graph();
    let first = add_process(&mut graph, "arithmetic.add");
    graph.store(first).unwrap();
    let second = add_process(&mut graph, "arithmetic.add");
    graph.store(second).unwrap();
    assert!(graph.get_cache_source(second).unwrap().is_none());
}

#[test]
fn plugin_identifiers_never_block_store() {
    for mut graph in [new_graph(), caching_graph()] {
        let first = graph
            .add(
                Node::builder(NodeType::Data)
                    .type_string("data.my-plugin.Foo.")
                    .attribute("value", 1),
            )
            .unwrap();
        graph.store(first).unwrap();
        let second = graph
            .add(
                Node::builder(NodeType::Data)
                    .type_string("data.my-plugin.Foo.")
                    .attribute("value", 1),
            )
            .unwrap();
        graph.store(second).unwrap();
        assert!(graph.node(second).unwrap().is_stored());

        let calc = add_process(&mut graph, "my_pkg/module.add");
        graph.store(calc).unwrap();
        assert!(graph.node(calc).unwrap().is_stored());
    }

    let mut graph = caching_graph();
    let first = graph
        .add(Node::builder(NodeType::Data).type_string("data.my-plugin.Foo."))
        .unwrap();
    graph.store(first).unwrap();
    let second = graph
        .add(Node::builder(NodeType::Data).type_string("data.my-plugin.Foo."))
        .unwrap();
    graph.store(second).unwrap();
    assert_eq!(
        graph.get_cache_source(second).unwrap(),
        Some(graph.node(first).unwrap().uuid())
    );
}

