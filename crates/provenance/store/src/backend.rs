use crate::error::{StorageError, StorageResult};
use crate::model::{LinkRecord, NewLink, NodeDraft, NodePatch, NodeRecord};
use crate::profile::Profile;
use crate::query::{LinkFilter, NodeQuery};
use provenance_types::ContentHash;
use uuid::Uuid;

/// Transactional persistence of nodes, links and repository objects.
///
/// Reads outside a transaction see committed state only.
pub trait StorageBackend: Send + Sync {
    /// Identity of this backend instance; nodes of different instances
    /// can never be linked.
    fn instance_id(&self) -> Uuid;

    /// Profile context the backend was constructed with.
    fn profile(&self) -> &Profile;

    /// Open a write transaction. Dropping it without `commit` rolls back.
    fn begin(&self) -> StorageResult<Box<dyn Transaction + '_>>;

    fn get_node(&self, pk: i64) -> StorageResult<Option<NodeRecord>>;

    fn get_node_by_uuid(&self, uuid: &Uuid) -> StorageResult<Option<NodeRecord>>;

    /// Nodes matching `query`, ordered by pk.
    fn query_nodes(&self, query: &NodeQuery) -> StorageResult<Vec<NodeRecord>>;

    /// Links matching `filter`, ordered by link id.
    fn query_links(&self, filter: &LinkFilter) -> StorageResult<Vec<LinkRecord>>;

    /// Apply a single-field update to a stored node.
    fn update_node(&self, pk: i64, patch: NodePatch) -> StorageResult<()>;

    fn get_object(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn has_object(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get_object(key)?.is_some())
    }

    /// Stored, cache-valid nodes of `type_string` carrying `hash`.
    fn find_nodes_by_hash(
        &self,
        hash: &ContentHash,
        type_string: &str,
    ) -> StorageResult<Vec<NodeRecord>> {
        self.query_nodes(
            &NodeQuery::new()
                .hash(hash.clone())
                .type_string(type_string)
                .valid_cache_only(),
        )
    }
}

/// Staged writes against a backend.
///
/// Reads through a transaction see committed state plus everything staged
/// in it, so cardinality checks inside one transaction are consistent.
pub trait Transaction {
    /// Stage a node; the returned pk is final once committed.
    fn create_node(&mut self, draft: NodeDraft) -> StorageResult<i64>;

    /// Stage a link. Fails with [`StorageError::Conflict`] when the link
    /// would break the cardinality rule of its type.
    fn insert_link(&mut self, link: NewLink) -> StorageResult<LinkRecord>;

    /// Stage a repository object; returns its content-addressed key.
    fn put_object(&mut self, content: &[u8]) -> StorageResult<String>;

    fn get_node(&self, pk: i64) -> StorageResult<Option<NodeRecord>>;

    fn query_links(&self, filter: &LinkFilter) -> StorageResult<Vec<LinkRecord>>;

    fn delete_link(&mut self, id: i64) -> StorageResult<()>;

    /// Stage deletion of a node. Fails with [`StorageError::Conflict`] if
    /// links still touch it once staged link deletions are accounted for.
    fn delete_node(&mut self, pk: i64) -> StorageResult<()>;

    fn commit(self: Box<Self>) -> StorageResult<()>;
}

/// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
pub fn with_transaction<T, E, F>(backend: &dyn StorageBackend, f: F) -> Result<T, E>
where
    E: From<StorageError>,
    F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
{
    let mut txn = backend.begin()?;
    let value = f(txn.as_mut())?;
    txn.commit()?;
    Ok(value)
}
