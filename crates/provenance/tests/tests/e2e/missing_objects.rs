//! End-to-end test: hashing and cache clones when repository objects are
//! gone from the object store.

use provenance_graph::{CachingConfig, HashingError, Node, ProvenanceError};
use provenance_store::{
    InMemoryBackend, LinkFilter, LinkRecord, NodePatch, NodeQuery, NodeRecord, Profile,
    StorageBackend, StorageResult, Transaction,
};
use provenance_tests::graph_on;
use provenance_types::NodeType;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Backend whose object store can be told to forget everything.
#[derive(Default)]
struct ForgetfulBackend {
    inner: InMemoryBackend,
    forget: AtomicBool,
}

impl ForgetfulBackend {
    fn forget_objects(&self) {
        self.forget.store(true, Ordering::SeqCst);
    }
}

impl StorageBackend for ForgetfulBackend {
    fn instance_id(&self) -> Uuid {
        self.inner.instance_id()
    }

    fn profile(&self) -> &Profile {
        self.inner.profile()
    }

    fn begin(&self) -> StorageResult<Box<dyn Transaction + '_>> {
        self.inner.begin()
    }

    fn get_node(&self, pk: i64) -> StorageResult<Option<NodeRecord>> {
        self.inner.get_node(pk)
    }

    fn get_node_by_uuid(&self, uuid: &Uuid) -> StorageResult<Option<NodeRecord>> {
        self.inner.get_node_by_uuid(uuid)
    }

    fn query_nodes(&self, query: &NodeQuery) -> StorageResult<Vec<NodeRecord>> {
        self.inner.query_nodes(query)
    }

    fn query_links(&self, filter: &LinkFilter) -> StorageResult<Vec<LinkRecord>> {
        self.inner.query_links(filter)
    }

    fn update_node(&self, pk: i64, patch: NodePatch) -> StorageResult<()> {
        self.inner.update_node(pk, patch)
    }

    fn get_object(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        if self.forget.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get_object(key)
    }
}

fn data_with_file() -> provenance_graph::NodeBuilder {
    Node::builder(NodeType::Data)
        .attribute("kind", "structure")
        .file("structure.cif", b"data_cell".to_vec())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn missing_object_is_a_hashing_error() {
    let backend = Arc::new(ForgetfulBackend::default());
    let mut graph = graph_on(backend.clone(), CachingConfig::disabled());
    let node = graph.add(data_with_file()).unwrap();
    graph.store(node).unwrap();
    let stored_hash = graph.get_hash(node).unwrap();
    assert!(stored_hash.is_some());

    backend.forget_objects();
    let err = graph.compute_hash(node, false).unwrap_err();
    assert!(matches!(
        err,
        ProvenanceError::Hashing(HashingError::MissingObject { ref path }) if path == "structure.cif"
    ));
    assert_eq!(graph.compute_hash(node, true).unwrap(), None);
    // The persisted hash is untouched by a failed recomputation.
    assert_eq!(graph.get_hash(node).unwrap(), stored_hash);
}

#[test]
fn clone_from_incomplete_source_aborts_store() {
    let backend = Arc::new(ForgetfulBackend::default());
    let mut graph = graph_on(backend.clone(), CachingConfig::enabled());
    let source = graph.add(data_with_file()).unwrap();
    graph.store(source).unwrap();
    let nodes_before = backend.inner.node_count().unwrap();

    backend.forget_objects();
    let copy = graph.add(data_with_file()).unwrap();
    let err = graph.store(copy).unwrap_err();
    assert!(matches!(err, ProvenanceError::Storage(_)), "{err}");
    assert!(!graph.node(copy).unwrap().is_stored());
    assert_eq!(backend.inner.node_count().unwrap(), nodes_before);
}
