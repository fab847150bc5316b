//! End-to-end test: deleting nodes keeps the provenance record consistent.

use provenance_graph::{DeleteRules, NodeHandle, ProvenanceError, ProvenanceGraph};
use provenance_tests::{finished, new_graph};
use provenance_types::{LinkType, NodeType};

struct Workflow {
    graph: ProvenanceGraph,
    work: NodeHandle,
    calc: NodeHandle,
    input: NodeHandle,
    output: NodeHandle,
}

/// A workflow that takes `input`, calls `calc`, and returns the data
/// `calc` created.
fn workflow() -> Workflow {
    let mut graph = new_graph();
    let input = graph.create(NodeType::Data).unwrap();
    let work = finished(&mut graph, NodeType::WorkChain);
    let calc = finished(&mut graph, NodeType::CalcFunction);
    graph.add_incoming(work, input, LinkType::InputWork, "x").unwrap();
    graph.add_incoming(calc, input, LinkType::InputCalc, "x").unwrap();
    graph.add_incoming(calc, work, LinkType::CallCalc, "call").unwrap();
    graph.store(calc).unwrap();

    let output = graph.create(NodeType::Data).unwrap();
    graph.add_incoming(output, calc, LinkType::Create, "result").unwrap();
    graph.store(output).unwrap();
    graph.add_incoming(output, work, LinkType::Return, "result").unwrap();

    Workflow {
        graph,
        work,
        calc,
        input,
        output,
    }
}

#[test]
fn linked_nodes_refused_by_single_delete() {
    let mut wf = workflow();
    for handle in [wf.work, wf.calc, wf.input, wf.output] {
        assert!(matches!(
            wf.graph.delete_node(handle),
            Err(ProvenanceError::InvalidValue(_))
        ));
    }
}

#[test]
fn pending_links_block_single_delete() {
    let mut graph = new_graph();
    let data = graph.create(NodeType::Data).unwrap();
    graph.store(data).unwrap();
    let calc = graph.create(NodeType::CalcJob).unwrap();
    graph.add_incoming(calc, data, LinkType::InputCalc, "x").unwrap();
    assert!(graph.delete_node(data).is_err());
    assert!(graph.delete_node(calc).is_err());
}

#[test]
fn deleting_called_calculation_removes_caller_and_output() {
    let mut wf = workflow();
    let report = wf
        .graph
        .delete_nodes(&[wf.calc], DeleteRules::default(), false)
        .unwrap();

    assert!(!report.dry_run);
    assert_eq!(report.nodes.len(), 3);
    assert_eq!(report.links.len(), 5);
    for gone in [wf.work, wf.calc, wf.output] {
        assert!(matches!(
            wf.graph.node(gone),
            Err(ProvenanceError::NotExistent(_))
        ));
    }
    assert!(wf.graph.get_outgoing(wf.input, &[]).unwrap().is_empty());
    wf.graph.delete_node(wf.input).unwrap();
}

#[test]
fn return_links_never_followed() {
    let mut wf = workflow();
    let rules = DeleteRules {
        call_calc_forward: false,
        ..DeleteRules::default()
    };
    let report = wf.graph.delete_nodes(&[wf.work], rules, true).unwrap();
    assert_eq!(report.nodes.len(), 1);
    assert_eq!(report.links.len(), 3);

    let report = wf
        .graph
        .delete_nodes(&[wf.work], DeleteRules::default(), true)
        .unwrap();
    assert_eq!(report.nodes.len(), 3);
}

#[test]
fn cached_input_on_unstored_calculation_blocks_bulk_delete() {
    let mut graph = new_graph();
    let data = graph.create(NodeType::Data).unwrap();
    graph.store(data).unwrap();
    let calc = graph.create(NodeType::CalcJob).unwrap();
    graph.add_incoming(calc, data, LinkType::InputCalc, "x").unwrap();

    assert!(matches!(
        graph.delete_nodes(&[data], DeleteRules::default(), false),
        Err(ProvenanceError::InvalidValue(_))
    ));
    assert!(graph.node(data).unwrap().is_stored());
    assert_eq!(graph.get_incoming(calc, &[]).unwrap().len(), 1);

    graph.store(calc).unwrap();
    let incoming = graph.get_incoming(calc, &[]).unwrap();
    assert_eq!(incoming.one().unwrap().node, data);
}

