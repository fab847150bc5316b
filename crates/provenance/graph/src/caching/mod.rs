//! Content hashing and reuse of equivalent stored nodes.

mod hasher;
mod options;

pub(crate) use hasher::HashObject;
pub use hasher::{hash_value, HASH_SCHEME};
pub use options::CachingConfig;

use crate::error::ProvenanceResult;
use provenance_store::{
    LinkFilter, NewLink, NodeDraft, NodeRecord, StorageBackend, StorageError, StorageResult,
    Transaction,
};
use provenance_types::{ContentHash, LinkType};
use tracing::warn;

/// Whether a stored node may stand in for a new one.
///
/// Processes qualify only once finished, and never when they returned
/// data, since a clone could not reproduce those links.
pub(crate) fn is_usable_source(
    backend: &dyn StorageBackend,
    record: &NodeRecord,
) -> StorageResult<bool> {
    if !record.is_valid_cache || !record.node_type.is_cachable() {
        return Ok(false);
    }
    if record.node_type.is_process() {
        if !record.is_finished() {
            return Ok(false);
        }
        let returns =
            backend.query_links(&LinkFilter::outgoing(record.pk).link_type(LinkType::Return))?;
        if !returns.is_empty() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// First usable stored node of `type_string` carrying `hash`.
pub(crate) fn find_cache_source(
    backend: &dyn StorageBackend,
    hash: &ContentHash,
    type_string: &str,
) -> StorageResult<Option<NodeRecord>> {
    for candidate in backend.find_nodes_by_hash(hash, type_string)? {
        if is_usable_source(backend, &candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Every repository object of `record` must still be in the object store
/// before anything is cloned from it.
pub(crate) fn check_objects(backend: &dyn StorageBackend, record: &NodeRecord) -> ProvenanceResult<()> {
    for (path, key) in &record.repository {
        if !backend.has_object(key)? {
            warn!(source = %record.uuid, path = %path, "Cache source is missing a repository object");
            return Err(StorageError::NotFound(format!(
                "object `{}` of cache source {}",
                path, record.uuid
            ))
            .into());
        }
    }
    Ok(())
}

/// Clone the CREATE outputs of `source` as fresh nodes created by `pk`.
pub(crate) fn clone_outputs(
    backend: &dyn StorageBackend,
    txn: &mut dyn Transaction,
    source: &NodeRecord,
    pk: i64,
) -> ProvenanceResult<usize> {
    let outputs = backend.query_links(&LinkFilter::outgoing(source.pk).link_type(LinkType::Create))?;
    for link in &outputs {
        let output = backend
            .get_node(link.target)?
            .ok_or_else(|| StorageError::NotFound(format!("output node {}", link.target)))?;
        check_objects(backend, &output)?;
        let clone = txn.create_node(NodeDraft::from(&output))?;
        txn.insert_link(NewLink::new(pk, clone, LinkType::Create, link.label.clone()))?;
    }
    Ok(outputs.len())
}
