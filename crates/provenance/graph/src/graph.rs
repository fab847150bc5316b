//! The provenance graph session.
//!
//! [`ProvenanceGraph`] owns an arena of nodes addressed by [`NodeHandle`].
//! Unstored nodes and their cached incoming links stay in the arena until
//! [`ProvenanceGraph::store`] writes them to the backend, sources first.
//! Hashing and cache lookups happen on that path.

use crate::caching::{self, CachingConfig, HashObject};
use crate::error::{HashingError, ProvenanceError, ProvenanceResult};
use crate::links::{self, ExistingLink, LinkLookup, LinkManager, LinkSource, LinkTriple};
use crate::node::{
    check_attribute_mutable, validate_entry, Node, NodeBuilder, NodeHandle, PendingLink,
    RepositoryFile,
};
use provenance_store::{
    with_transaction, LinkDirection, LinkFilter, NewLink, NodeDraft, NodePatch, NodeRecord,
    Profile, StorageBackend,
};
use provenance_types::{ContentHash, LinkType, NodeType};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// A provenance graph session over one storage backend.
///
/// Nodes live in an arena owned by the graph and are addressed through
/// [`NodeHandle`]s. Unstored nodes and the links cached on them exist only
/// here until [`store`](Self::store) flushes them to the backend.
pub struct ProvenanceGraph {
    id: u64,
    backend: Arc<dyn StorageBackend>,
    caching: CachingConfig,
    nodes: Vec<Option<Node>>,
    by_uuid: HashMap<Uuid, NodeHandle>,
    by_pk: HashMap<i64, NodeHandle>,
}

impl ProvenanceGraph {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_caching(backend, CachingConfig::default())
    }

    pub fn with_caching(backend: Arc<dyn StorageBackend>, caching: CachingConfig) -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            backend,
            caching,
            nodes: Vec::new(),
            by_uuid: HashMap::new(),
            by_pk: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn profile(&self) -> &Profile {
        self.backend.profile()
    }

    pub fn caching(&self) -> &CachingConfig {
        &self.caching
    }

    pub fn set_caching(&mut self, caching: CachingConfig) {
        self.caching = caching;
    }

    // -----------------------------------------------------------------------
    // Arena
    // -----------------------------------------------------------------------

    fn insert(&mut self, node: Node) -> NodeHandle {
        let handle = NodeHandle {
            graph: self.id,
            index: self.nodes.len(),
        };
        self.by_uuid.insert(node.uuid, handle);
        if let Some(pk) = node.pk {
            self.by_pk.insert(pk, handle);
        }
        self.nodes.push(Some(node));
        handle
    }

    pub fn node(&self, handle: NodeHandle) -> ProvenanceResult<&Node> {
        if handle.graph != self.id {
            return Err(ProvenanceError::TypeMismatch(format!(
                "{} does not belong to this graph",
                handle
            )));
        }
        self.nodes
            .get(handle.index)
            .and_then(Option::as_ref)
            .ok_or_else(|| ProvenanceError::NotExistent(format!("{} was deleted", handle)))
    }

    pub(crate) fn node_mut(&mut self, handle: NodeHandle) -> ProvenanceResult<&mut Node> {
        self.node(handle)?;
        self.nodes
            .get_mut(handle.index)
            .and_then(Option::as_mut)
            .ok_or_else(|| ProvenanceError::NotExistent(format!("{} was deleted", handle)))
    }

    /// Handle of a node already present in this graph.
    pub fn handle_of(&self, uuid: &Uuid) -> Option<NodeHandle> {
        self.by_uuid.get(uuid).copied()
    }

    /// Handles of all live nodes, in creation order.
    pub fn handles(&self) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(index, _)| NodeHandle {
                graph: self.id,
                index,
            })
            .collect()
    }

    fn stored_pk(&self, handle: NodeHandle) -> ProvenanceResult<i64> {
        let node = self.node(handle)?;
        node.pk
            .ok_or_else(|| ProvenanceError::InvalidValue(format!("{} is not stored", node)))
    }

    /// Replace the arena copy of a stored node with the backend row.
    fn refresh(&mut self, handle: NodeHandle) -> ProvenanceResult<()> {
        let pk = self.stored_pk(handle)?;
        let record = self
            .backend
            .get_node(pk)?
            .ok_or_else(|| ProvenanceError::NotExistent(format!("node {} vanished", pk)))?;
        let node = Node::from_record(record, self.backend.instance_id());
        *self.node_mut(handle)? = node;
        Ok(())
    }

    /// Release a node from the arena, dropping links still cached from it.
    pub(crate) fn evict(&mut self, handle: NodeHandle) {
        if let Some(node) = self.nodes.get_mut(handle.index).and_then(Option::take) {
            self.by_uuid.remove(&node.uuid);
            if let Some(pk) = node.pk {
                self.by_pk.remove(&pk);
            }
        }
        for node in self.nodes.iter_mut().flatten() {
            node.incoming_cache.retain(|p| p.source != handle);
        }
    }

    pub(crate) fn handle_of_pk(&self, pk: i64) -> Option<NodeHandle> {
        self.by_pk.get(&pk).copied()
    }

    // -----------------------------------------------------------------------
    // Creation and loading
    // -----------------------------------------------------------------------

    /// New unstored node of `node_type` with default settings.
    pub fn create(&mut self, node_type: NodeType) -> ProvenanceResult<NodeHandle> {
        self.add(Node::builder(node_type))
    }

    pub fn add(&mut self, builder: NodeBuilder) -> ProvenanceResult<NodeHandle> {
        let node = builder.build(self.backend.instance_id(), self.backend.profile())?;
        if self.by_uuid.contains_key(&node.uuid) {
            return Err(ProvenanceError::InvalidValue(format!(
                "a node with uuid {} already exists",
                node.uuid
            )));
        }
        Ok(self.insert(node))
    }

    /// Bring a stored node into the graph; loading twice yields one handle.
    pub fn load(&mut self, uuid: Uuid) -> ProvenanceResult<NodeHandle> {
        if let Some(handle) = self.handle_of(&uuid) {
            return Ok(handle);
        }
        let record = self
            .backend
            .get_node_by_uuid(&uuid)?
            .ok_or_else(|| ProvenanceError::NotExistent(format!("no node with uuid {}", uuid)))?;
        Ok(self.insert(Node::from_record(record, self.backend.instance_id())))
    }

    pub fn load_pk(&mut self, pk: i64) -> ProvenanceResult<NodeHandle> {
        if let Some(handle) = self.handle_of_pk(pk) {
            return Ok(handle);
        }
        let record = self
            .backend
            .get_node(pk)?
            .ok_or_else(|| ProvenanceError::NotExistent(format!("no node with pk {}", pk)))?;
        Ok(self.insert(Node::from_record(record, self.backend.instance_id())))
    }

    // -----------------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------------

    /// Check whether `source --link_type/label--> target` may be added.
    pub fn validate_link(
        &self,
        source: NodeHandle,
        target: NodeHandle,
        link_type: LinkType,
        label: &str,
    ) -> ProvenanceResult<()> {
        links::validate_link(self, self.node(source)?, self.node(target)?, link_type, label)
    }

    /// Add a link from `source` into `target`.
    ///
    /// Into an unstored target the link is cached until the target is
    /// stored. Into a stored target the source is stored first, if needed,
    /// and the link is inserted right away.
    pub fn add_incoming(
        &mut self,
        target: NodeHandle,
        source: NodeHandle,
        link_type: LinkType,
        label: &str,
    ) -> ProvenanceResult<()> {
        self.validate_link(source, target, link_type, label)?;

        if !self.node(target)?.is_stored() {
            self.node_mut(target)?.incoming_cache.push(PendingLink {
                source,
                link_type,
                label: label.to_string(),
            });
            debug!(%source, %target, %link_type, label, "Cached link");
            return Ok(());
        }

        if !self.node(source)?.is_stored() {
            self.store(source)?;
        }
        let link = NewLink::new(
            self.stored_pk(source)?,
            self.stored_pk(target)?,
            link_type,
            label,
        );
        let record = with_transaction::<_, ProvenanceError, _>(self.backend.as_ref(), |txn| {
            Ok(txn.insert_link(link)?)
        })?;
        debug!(id = record.id, %link_type, label, "Inserted link");
        Ok(())
    }

    pub fn get_incoming(
        &mut self,
        handle: NodeHandle,
        link_types: &[LinkType],
    ) -> ProvenanceResult<LinkManager> {
        let sources = self.existing_links(self.node(handle)?, LinkDirection::Incoming, link_types)?;
        self.link_manager(sources)
    }

    pub fn get_outgoing(
        &mut self,
        handle: NodeHandle,
        link_types: &[LinkType],
    ) -> ProvenanceResult<LinkManager> {
        let sources = self.existing_links(self.node(handle)?, LinkDirection::Outgoing, link_types)?;
        self.link_manager(sources)
    }

    fn link_manager(&mut self, sources: Vec<LinkSource>) -> ProvenanceResult<LinkManager> {
        let mut triples = Vec::new();
        for source in &sources {
            for link in source.iter() {
                let node = self.load(link.peer)?;
                triples.push(LinkTriple::new(node, link.link_type, link.label));
            }
        }
        Ok(LinkManager::new(triples))
    }

    pub(crate) fn pending_outgoing(&self, source: NodeHandle, wanted: impl Fn(LinkType) -> bool) -> Vec<ExistingLink> {
        let mut links = Vec::new();
        for target in self.nodes.iter().flatten() {
            for pending in &target.incoming_cache {
                if pending.source == source && wanted(pending.link_type) {
                    links.push(ExistingLink {
                        peer: target.uuid,
                        link_type: pending.link_type,
                        label: pending.label.clone(),
                    });
                }
            }
        }
        links
    }

    // -----------------------------------------------------------------------
    // Storing
    // -----------------------------------------------------------------------

    /// Store a node, first storing every unstored node it has cached
    /// incoming links from. Storing a stored node does nothing.
    pub fn store(&mut self, handle: NodeHandle) -> ProvenanceResult<()> {
        if self.node(handle)?.is_stored() {
            return Ok(());
        }
        for next in self.store_order(handle)? {
            self.store_single(next)?;
        }
        Ok(())
    }

    /// Unstored ancestors of `root` through cached links, sources first.
    fn store_order(&self, root: NodeHandle) -> ProvenanceResult<Vec<NodeHandle>> {
        #[derive(PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<NodeHandle, Mark> = HashMap::new();
        let mut order = Vec::new();
        let mut stack = vec![(root, false)];

        while let Some((handle, expanded)) = stack.pop() {
            if expanded {
                marks.insert(handle, Mark::Done);
                order.push(handle);
                continue;
            }
            match marks.get(&handle) {
                Some(Mark::Done) => continue,
                Some(Mark::Visiting) => {
                    return Err(ProvenanceError::InvalidValue(format!(
                        "cached links through {} form a cycle",
                        handle
                    )))
                }
                None => {}
            }
            marks.insert(handle, Mark::Visiting);
            stack.push((handle, true));

            for pending in &self.node(handle)?.incoming_cache {
                if self.node(pending.source)?.is_stored() {
                    continue;
                }
                match marks.get(&pending.source) {
                    Some(Mark::Visiting) => {
                        return Err(ProvenanceError::InvalidValue(format!(
                            "cached links through {} form a cycle",
                            pending.source
                        )))
                    }
                    Some(Mark::Done) => {}
                    None => stack.push((pending.source, false)),
                }
            }
        }
        Ok(order)
    }

    fn store_single(&mut self, handle: NodeHandle) -> ProvenanceResult<()> {
        let hash = self.compute_hash(handle, true)?;
        let cache_source = match &hash {
            Some(hash) => self.cache_candidate(handle, hash)?,
            None => None,
        };

        let node = self.node(handle)?;
        let mut links = Vec::with_capacity(node.incoming_cache.len());
        for pending in &node.incoming_cache {
            links.push((self.stored_pk(pending.source)?, pending.link_type, pending.label.clone()));
        }
        let files: Vec<(String, RepositoryFile)> = node
            .repository
            .iter()
            .map(|(path, file)| (path.to_string(), file.clone()))
            .collect();
        let mut draft = NodeDraft {
            uuid: node.uuid,
            node_type: node.node_type,
            type_string: node.type_string.clone(),
            process_type: node.process_type.clone(),
            label: node.label.clone(),
            description: node.description.clone(),
            user_email: node.user_email.clone(),
            attributes: node.attributes.clone(),
            extras: node.extras.clone(),
            repository: BTreeMap::new(),
            sealed: false,
            is_valid_cache: node.is_valid_cache,
            hash,
            cache_source: None,
        };
        if let Some(source) = &cache_source {
            apply_cache_source(&mut draft, source);
        }

        let backend = Arc::clone(&self.backend);
        let (pk, outputs) = with_transaction::<_, ProvenanceError, _>(backend.as_ref(), |txn| {
            draft.repository = match &cache_source {
                Some(source) => {
                    caching::check_objects(backend.as_ref(), source)?;
                    source.repository.clone()
                }
                None => {
                    let mut keys = BTreeMap::new();
                    for (path, file) in &files {
                        let key = match file {
                            RepositoryFile::Pending(content) => txn.put_object(content)?,
                            RepositoryFile::Stored { key } => key.clone(),
                        };
                        keys.insert(path.clone(), key);
                    }
                    keys
                }
            };
            let pk = txn.create_node(draft)?;
            for (source_pk, link_type, label) in links {
                txn.insert_link(NewLink::new(source_pk, pk, link_type, label))?;
            }
            let outputs = match &cache_source {
                Some(source) => caching::clone_outputs(backend.as_ref(), txn, source, pk)?,
                None => 0,
            };
            Ok((pk, outputs))
        })?;

        self.node_mut(handle)?.pk = Some(pk);
        self.by_pk.insert(pk, handle);
        self.refresh(handle)?;
        let node = self.node(handle)?;
        match &cache_source {
            Some(source) => info!(
                uuid = %node.uuid,
                pk,
                source = %source.uuid,
                outputs,
                "Stored node from cache"
            ),
            None => debug!(uuid = %node.uuid, pk, node_type = %node.node_type, "Stored node"),
        }
        Ok(())
    }

    fn cache_candidate(
        &self,
        handle: NodeHandle,
        hash: &ContentHash,
    ) -> ProvenanceResult<Option<NodeRecord>> {
        let node = self.node(handle)?;
        if !node.is_valid_cache || !node.node_type.is_cachable() {
            return Ok(None);
        }
        if !self.caching.use_cache(node.cache_identifier())? {
            return Ok(None);
        }
        Ok(caching::find_cache_source(
            self.backend.as_ref(),
            hash,
            &node.type_string,
        )?)
    }

    // -----------------------------------------------------------------------
    // Hashing
    // -----------------------------------------------------------------------

    /// Hash of the node's hashable content.
    ///
    /// With `ignore_errors` a failure is logged and `None` returned instead.
    pub fn compute_hash(
        &mut self,
        handle: NodeHandle,
        ignore_errors: bool,
    ) -> ProvenanceResult<Option<ContentHash>> {
        self.node(handle)?;
        match self.content_hash(handle) {
            Ok(hash) => Ok(Some(hash)),
            Err(e) if ignore_errors => {
                error!(node = %handle, error = %e, "Ignoring hashing failure");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn content_hash(&mut self, handle: NodeHandle) -> ProvenanceResult<ContentHash> {
        let inputs = if self.node(handle)?.node_type.is_process() {
            Some(self.input_hashes(handle)?)
        } else {
            None
        };

        let node = self.node(handle)?;
        let mut repository = BTreeMap::new();
        for (path, file) in node.repository.iter() {
            let digest = match file {
                RepositoryFile::Pending(content) => blake3::hash(content).to_hex().to_string(),
                RepositoryFile::Stored { key } => {
                    let content = self
                        .backend
                        .get_object(key)
                        .map_err(HashingError::from)?
                        .ok_or_else(|| HashingError::MissingObject {
                            path: path.to_string(),
                        })?;
                    blake3::hash(&content).to_hex().to_string()
                }
            };
            repository.insert(path, digest);
        }

        let object = HashObject {
            type_string: &node.type_string,
            process_type: node.process_type.as_deref(),
            attributes: node
                .attributes
                .iter()
                .filter(|(key, _)| !node.node_type.is_hash_ignored_attribute(key))
                .map(|(key, value)| (key.as_str(), value))
                .collect(),
            repository,
            inputs,
        };
        Ok(object.digest()?)
    }

    /// Hashes of the nodes linked in through INPUT links, by label.
    fn input_hashes(&mut self, handle: NodeHandle) -> ProvenanceResult<BTreeMap<String, ContentHash>> {
        let inputs = self.get_incoming(handle, &[LinkType::InputCalc, LinkType::InputWork])?;
        let mut hashes = BTreeMap::new();
        for triple in inputs {
            let hash = match self.node(triple.node)?.hash.clone() {
                Some(hash) => hash,
                None => self.content_hash(triple.node)?,
            };
            hashes.insert(triple.link_label, hash);
        }
        Ok(hashes)
    }

    /// Recompute and persist the hash of a stored node.
    pub fn rehash(&mut self, handle: NodeHandle) -> ProvenanceResult<ContentHash> {
        let pk = self.stored_pk(handle)?;
        let hash = self.content_hash(handle)?;
        self.backend.update_node(pk, NodePatch::SetHash(Some(hash.clone())))?;
        self.refresh(handle)?;
        debug!(node = %handle, %hash, "Rehashed node");
        Ok(hash)
    }

    /// Drop the persisted hash so the node is no longer found as a cache
    /// source.
    pub fn clear_hash(&mut self, handle: NodeHandle) -> ProvenanceResult<()> {
        let pk = self.stored_pk(handle)?;
        self.backend.update_node(pk, NodePatch::SetHash(None))?;
        self.refresh(handle)
    }

    pub fn get_hash(&self, handle: NodeHandle) -> ProvenanceResult<Option<ContentHash>> {
        Ok(self.node(handle)?.hash.clone())
    }

    pub fn get_cache_source(&self, handle: NodeHandle) -> ProvenanceResult<Option<Uuid>> {
        Ok(self.node(handle)?.cache_source)
    }

    pub fn is_valid_cache(&self, handle: NodeHandle) -> ProvenanceResult<bool> {
        Ok(self.node(handle)?.is_valid_cache)
    }

    /// Opt a node in or out of caching; allowed in every lifecycle stage.
    pub fn set_valid_cache(&mut self, handle: NodeHandle, valid: bool) -> ProvenanceResult<()> {
        match self.node(handle)?.pk {
            Some(pk) => {
                self.backend.update_node(pk, NodePatch::SetValidCache(valid))?;
                self.refresh(handle)
            }
            None => {
                self.node_mut(handle)?.is_valid_cache = valid;
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle and attribute/extra store
    // -----------------------------------------------------------------------

    /// Lock a stored process node; only extras stay mutable afterwards.
    pub fn seal(&mut self, handle: NodeHandle) -> ProvenanceResult<()> {
        let node = self.node(handle)?;
        if !node.node_type.is_sealable() {
            return Err(ProvenanceError::TypeMismatch(format!(
                "{} cannot be sealed, only process nodes can",
                node
            )));
        }
        if node.sealed {
            return Ok(());
        }
        let pk = self.stored_pk(handle)?;
        self.backend.update_node(pk, NodePatch::Seal)?;
        self.refresh(handle)?;
        debug!(node = %handle, pk, "Sealed node");
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        handle: NodeHandle,
        key: &str,
        value: impl Into<Value>,
    ) -> ProvenanceResult<()> {
        let value = value.into();
        validate_entry(key, &value)?;
        let node = self.node(handle)?;
        check_attribute_mutable(node, key)?;
        match node.pk {
            Some(pk) => {
                self.backend.update_node(
                    pk,
                    NodePatch::SetAttribute {
                        key: key.to_string(),
                        value,
                    },
                )?;
                self.refresh(handle)
            }
            None => {
                self.node_mut(handle)?.attributes.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    pub fn delete_attribute(&mut self, handle: NodeHandle, key: &str) -> ProvenanceResult<()> {
        let node = self.node(handle)?;
        check_attribute_mutable(node, key)?;
        if !node.attributes.contains_key(key) {
            return Err(ProvenanceError::MissingKey(format!("attribute `{}`", key)));
        }
        match node.pk {
            Some(pk) => {
                self.backend.update_node(
                    pk,
                    NodePatch::DeleteAttribute {
                        key: key.to_string(),
                    },
                )?;
                self.refresh(handle)
            }
            None => {
                self.node_mut(handle)?.attributes.remove(key);
                Ok(())
            }
        }
    }

    /// Extras stay mutable in every lifecycle stage.
    pub fn set_extra(
        &mut self,
        handle: NodeHandle,
        key: &str,
        value: impl Into<Value>,
    ) -> ProvenanceResult<()> {
        let value = value.into();
        validate_entry(key, &value)?;
        match self.node(handle)?.pk {
            Some(pk) => {
                self.backend.update_node(
                    pk,
                    NodePatch::SetExtra {
                        key: key.to_string(),
                        value,
                    },
                )?;
                self.refresh(handle)
            }
            None => {
                self.node_mut(handle)?.extras.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    pub fn delete_extra(&mut self, handle: NodeHandle, key: &str) -> ProvenanceResult<()> {
        let node = self.node(handle)?;
        if !node.extras.contains_key(key) {
            return Err(ProvenanceError::MissingKey(format!("extra `{}`", key)));
        }
        match node.pk {
            Some(pk) => {
                self.backend.update_node(
                    pk,
                    NodePatch::DeleteExtra {
                        key: key.to_string(),
                    },
                )?;
                self.refresh(handle)
            }
            None => {
                self.node_mut(handle)?.extras.remove(key);
                Ok(())
            }
        }
    }

    /// Write a repository file; only while the node is unstored.
    pub fn put_object(
        &mut self,
        handle: NodeHandle,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> ProvenanceResult<()> {
        let node = self.node_mut(handle)?;
        if node.is_stored() {
            return Err(ProvenanceError::ModificationNotAllowed(format!(
                "repository of stored node {} is immutable",
                node
            )));
        }
        node.repository.put(path, content.into())
    }

    pub fn get_object_content(&self, handle: NodeHandle, path: &str) -> ProvenanceResult<Vec<u8>> {
        let node = self.node(handle)?;
        let missing = || ProvenanceError::NotExistent(format!("no file `{}` in {}", path, node));
        match node.repository.get(path).ok_or_else(missing)? {
            RepositoryFile::Pending(content) => Ok(content.clone()),
            RepositoryFile::Stored { key } => self.backend.get_object(key)?.ok_or_else(missing),
        }
    }
}

/// Take over the content of a cache source into a node about to be stored.
fn apply_cache_source(draft: &mut NodeDraft, source: &NodeRecord) {
    let own_extras = std::mem::replace(&mut draft.extras, source.extras.clone());
    draft.extras.extend(own_extras);
    draft.attributes = source.attributes.clone();
    draft.label = source.label.clone();
    draft.description = source.description.clone();
    draft.sealed = source.sealed;
    draft.cache_source = Some(source.uuid);
}

impl LinkLookup for ProvenanceGraph {
    fn existing_links(
        &self,
        node: &Node,
        direction: LinkDirection,
        link_types: &[LinkType],
    ) -> ProvenanceResult<Vec<LinkSource>> {
        let wanted = |t: LinkType| link_types.is_empty() || link_types.contains(&t);
        let mut sources = Vec::new();

        if let Some(pk) = node.pk {
            let filter = LinkFilter::new(pk, direction).link_types(link_types.iter().copied());
            sources.push(LinkSource::Stored {
                direction,
                rows: self.backend.query_links(&filter)?,
            });
        }

        let pending = match direction {
            // A stored node has no cached incoming links.
            LinkDirection::Incoming if node.pk.is_some() => Vec::new(),
            LinkDirection::Incoming => node
                .incoming_cache
                .iter()
                .filter(|p| wanted(p.link_type))
                .filter_map(|p| {
                    let source = self.node(p.source).ok()?;
                    Some(ExistingLink {
                        peer: source.uuid,
                        link_type: p.link_type,
                        label: p.label.clone(),
                    })
                })
                .collect(),
            LinkDirection::Outgoing => match self.handle_of(&node.uuid) {
                Some(handle) => self.pending_outgoing(handle, wanted),
                None => Vec::new(),
            },
        };
        sources.push(LinkSource::Pending(pending));
        Ok(sources)
    }
}
