//! In-memory reference implementation of the storage traits.
//!
//! Deterministic and test-friendly. Writes are staged per transaction and
//! applied under a single write lock at commit, after the link constraints
//! have been re-checked against the committed state.

use crate::backend::{StorageBackend, Transaction};
use crate::constraints;
use crate::error::{StorageError, StorageResult};
use crate::model::{LinkRecord, NewLink, NodeDraft, NodePatch, NodeRecord};
use crate::profile::Profile;
use crate::query::{LinkFilter, NodeQuery};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct State {
    nodes: BTreeMap<i64, NodeRecord>,
    links: BTreeMap<i64, LinkRecord>,
    objects: HashMap<String, Vec<u8>>,
}

/// In-memory storage backend.
pub struct InMemoryBackend {
    instance_id: Uuid,
    profile: Profile,
    state: RwLock<State>,
    // Sequences are never rolled back, like database sequences.
    next_node_pk: AtomicI64,
    next_link_id: AtomicI64,
}

impl InMemoryBackend {
    pub fn new(profile: Profile) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            profile,
            state: RwLock::new(State::default()),
            next_node_pk: AtomicI64::new(1),
            next_link_id: AtomicI64::new(1),
        }
    }

    pub fn node_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.nodes.len())
    }

    pub fn link_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.links.len())
    }

    pub fn object_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.objects.len())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StorageError::Backend("state lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StorageError::Backend("state lock poisoned".to_string()))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}

impl StorageBackend for InMemoryBackend {
    fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    fn profile(&self) -> &Profile {
        &self.profile
    }

    fn begin(&self) -> StorageResult<Box<dyn Transaction + '_>> {
        Ok(Box::new(InMemoryTransaction {
            backend: self,
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            objects: HashMap::new(),
            deleted_nodes: BTreeSet::new(),
            deleted_links: BTreeSet::new(),
            committed: false,
        }))
    }

    fn get_node(&self, pk: i64) -> StorageResult<Option<NodeRecord>> {
        Ok(self.read()?.nodes.get(&pk).cloned())
    }

    fn get_node_by_uuid(&self, uuid: &Uuid) -> StorageResult<Option<NodeRecord>> {
        Ok(self
            .read()?
            .nodes
            .values()
            .find(|n| n.uuid == *uuid)
            .cloned())
    }

    fn query_nodes(&self, query: &NodeQuery) -> StorageResult<Vec<NodeRecord>> {
        Ok(self
            .read()?
            .nodes
            .values()
            .filter(|n| query.matches(n))
            .cloned()
            .collect())
    }

    fn query_links(&self, filter: &LinkFilter) -> StorageResult<Vec<LinkRecord>> {
        Ok(self
            .read()?
            .links
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }

    fn update_node(&self, pk: i64, patch: NodePatch) -> StorageResult<()> {
        let mut state = self.write()?;
        let record = state
            .nodes
            .get_mut(&pk)
            .ok_or_else(|| StorageError::NotFound(format!("node {} not found", pk)))?;

        if record.sealed && patch.modifies_attributes() {
            return Err(StorageError::InvariantViolation(format!(
                "node {} is sealed",
                pk
            )));
        }

        match patch {
            NodePatch::SetAttribute { key, value } => {
                record.attributes.insert(key, value);
            }
            NodePatch::DeleteAttribute { key } => {
                record
                    .attributes
                    .remove(&key)
                    .ok_or_else(|| StorageError::NotFound(format!("attribute `{}`", key)))?;
            }
            NodePatch::SetExtra { key, value } => {
                record.extras.insert(key, value);
            }
            NodePatch::DeleteExtra { key } => {
                record
                    .extras
                    .remove(&key)
                    .ok_or_else(|| StorageError::NotFound(format!("extra `{}`", key)))?;
            }
            NodePatch::Seal => record.sealed = true,
            NodePatch::SetValidCache(valid) => record.is_valid_cache = valid,
            NodePatch::SetHash(hash) => record.hash = hash,
        }
        record.mtime = Utc::now();
        Ok(())
    }

    fn get_object(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.read()?.objects.get(key).cloned())
    }
}

/// Transaction over [`InMemoryBackend`].
pub struct InMemoryTransaction<'a> {
    backend: &'a InMemoryBackend,
    nodes: BTreeMap<i64, NodeRecord>,
    links: BTreeMap<i64, LinkRecord>,
    objects: HashMap<String, Vec<u8>>,
    deleted_nodes: BTreeSet<i64>,
    deleted_links: BTreeSet<i64>,
    committed: bool,
}

impl InMemoryTransaction<'_> {
    /// Committed links still alive in this transaction, then staged ones.
    fn visible_links(&self, state: &State) -> Vec<LinkRecord> {
        state
            .links
            .values()
            .filter(|l| !self.deleted_links.contains(&l.id))
            .chain(self.links.values())
            .cloned()
            .collect()
    }

    fn visible_node(&self, state: &State, pk: i64) -> Option<NodeRecord> {
        if self.deleted_nodes.contains(&pk) {
            return None;
        }
        self.nodes
            .get(&pk)
            .or_else(|| state.nodes.get(&pk))
            .cloned()
    }
}

impl Transaction for InMemoryTransaction<'_> {
    fn create_node(&mut self, draft: NodeDraft) -> StorageResult<i64> {
        {
            let state = self.backend.read()?;
            let duplicate = state.nodes.values().any(|n| n.uuid == draft.uuid)
                || self.nodes.values().any(|n| n.uuid == draft.uuid);
            if duplicate {
                return Err(StorageError::Conflict(format!(
                    "node with uuid {} already exists",
                    draft.uuid
                )));
            }
        }
        let pk = self.backend.next_node_pk.fetch_add(1, Ordering::SeqCst);
        self.nodes.insert(pk, draft.into_record(pk, Utc::now()));
        Ok(pk)
    }

    fn insert_link(&mut self, link: NewLink) -> StorageResult<LinkRecord> {
        let state = self.backend.read()?;
        let source = self
            .visible_node(&state, link.source)
            .ok_or_else(|| StorageError::NotFound(format!("source node {}", link.source)))?;
        let target = self
            .visible_node(&state, link.target)
            .ok_or_else(|| StorageError::NotFound(format!("target node {}", link.target)))?;
        constraints::check_link(&self.visible_links(&state), &link)?;
        drop(state);

        let record = LinkRecord {
            id: self.backend.next_link_id.fetch_add(1, Ordering::SeqCst),
            source: link.source,
            source_uuid: source.uuid,
            target: link.target,
            target_uuid: target.uuid,
            link_type: link.link_type,
            label: link.label,
        };
        self.links.insert(record.id, record.clone());
        Ok(record)
    }

    fn put_object(&mut self, content: &[u8]) -> StorageResult<String> {
        let key = blake3::hash(content).to_hex().to_string();
        self.objects
            .entry(key.clone())
            .or_insert_with(|| content.to_vec());
        Ok(key)
    }

    fn get_node(&self, pk: i64) -> StorageResult<Option<NodeRecord>> {
        let state = self.backend.read()?;
        Ok(self.visible_node(&state, pk))
    }

    fn query_links(&self, filter: &LinkFilter) -> StorageResult<Vec<LinkRecord>> {
        let state = self.backend.read()?;
        Ok(self
            .visible_links(&state)
            .into_iter()
            .filter(|l| filter.matches(l))
            .collect())
    }

    fn delete_link(&mut self, id: i64) -> StorageResult<()> {
        if self.links.remove(&id).is_some() {
            return Ok(());
        }
        if !self.backend.read()?.links.contains_key(&id) {
            return Err(StorageError::NotFound(format!("link {}", id)));
        }
        self.deleted_links.insert(id);
        Ok(())
    }

    fn delete_node(&mut self, pk: i64) -> StorageResult<()> {
        let state = self.backend.read()?;
        if self.visible_node(&state, pk).is_none() {
            return Err(StorageError::NotFound(format!("node {}", pk)));
        }
        if let Some(link) = self
            .visible_links(&state)
            .into_iter()
            .find(|l| l.source == pk || l.target == pk)
        {
            return Err(StorageError::Conflict(format!(
                "node {} still has {} link {} `{}`",
                pk, link.link_type, link.id, link.label
            )));
        }
        drop(state);
        if self.nodes.remove(&pk).is_none() {
            self.deleted_nodes.insert(pk);
        }
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> StorageResult<()> {
        let backend = self.backend;
        let mut state = backend.write()?;

        // Re-validate against whatever other transactions committed meanwhile.
        for pk in &self.deleted_nodes {
            if !state.nodes.contains_key(pk) {
                return Err(StorageError::NotFound(format!("node {} vanished", pk)));
            }
        }
        let mut surviving: Vec<LinkRecord> = state
            .links
            .values()
            .filter(|l| !self.deleted_links.contains(&l.id))
            .cloned()
            .collect();
        for link in self.links.values() {
            let new = NewLink::new(link.source, link.target, link.link_type, link.label.clone());
            constraints::check_link(&surviving, &new)?;
            for endpoint in [link.source, link.target] {
                let alive = !self.deleted_nodes.contains(&endpoint)
                    && (self.nodes.contains_key(&endpoint) || state.nodes.contains_key(&endpoint));
                if !alive {
                    return Err(StorageError::Conflict(format!(
                        "link {} references missing node {}",
                        link.id, endpoint
                    )));
                }
            }
            surviving.push(link.clone());
        }
        if let Some(link) = surviving
            .iter()
            .find(|l| self.deleted_nodes.contains(&l.source) || self.deleted_nodes.contains(&l.target))
        {
            return Err(StorageError::Conflict(format!(
                "link {} still references a deleted node",
                link.id
            )));
        }

        for id in &self.deleted_links {
            state.links.remove(id);
        }
        for pk in &self.deleted_nodes {
            state.nodes.remove(pk);
        }
        let (nodes, links, objects) = (
            std::mem::take(&mut self.nodes),
            std::mem::take(&mut self.links),
            std::mem::take(&mut self.objects),
        );
        let (node_count, link_count) = (nodes.len(), links.len());
        state.nodes.extend(nodes);
        state.links.extend(links);
        for (key, content) in objects {
            state.objects.entry(key).or_insert(content);
        }
        drop(state);

        self.committed = true;
        debug!(
            nodes = node_count,
            links = link_count,
            deleted_nodes = self.deleted_nodes.len(),
            "Committed transaction"
        );
        Ok(())
    }
}

impl Drop for InMemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed && (!self.nodes.is_empty() || !self.links.is_empty()) {
            debug!(
                nodes = self.nodes.len(),
                links = self.links.len(),
                "Rolled back transaction"
            );
        }
    }
}
