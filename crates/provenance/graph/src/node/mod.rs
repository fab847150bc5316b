//! Nodes of the provenance graph.
//!
//! A [`Node`] lives in the arena of a [`ProvenanceGraph`](crate::ProvenanceGraph)
//! and is addressed by a [`NodeHandle`]. All mutation goes through the graph
//! so that stored nodes stay in sync with the backend.

mod attributes;
mod repository;

pub(crate) use attributes::{check_attribute_mutable, validate_entry};
pub use repository::{validate_path, Repository, RepositoryFile};

use crate::error::{ProvenanceError, ProvenanceResult};
use chrono::{DateTime, Utc};
use provenance_store::{JsonMap, NodeRecord, Profile};
use provenance_types::{ContentHash, LinkType, NodeType};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Index of a node inside one graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle {
    pub(crate) graph: u64,
    pub(crate) index: usize,
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.index)
    }
}

/// Lifecycle stage of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// In memory only; freely mutable, no pk.
    Unstored,
    /// Persisted; only updatable attributes and extras may change.
    Stored,
    /// Process node locked for good; only extras may change.
    Sealed,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstored => write!(f, "unstored"),
            Self::Stored => write!(f, "stored"),
            Self::Sealed => write!(f, "sealed"),
        }
    }
}

/// Incoming link held on an unstored target until it is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingLink {
    pub source: NodeHandle,
    pub link_type: LinkType,
    pub label: String,
}

/// A vertex of the provenance graph.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) backend_id: Uuid,
    pub(crate) uuid: Uuid,
    pub(crate) pk: Option<i64>,
    pub(crate) node_type: NodeType,
    pub(crate) type_string: String,
    pub(crate) process_type: Option<String>,
    pub(crate) label: String,
    pub(crate) description: String,
    pub(crate) user_email: String,
    pub(crate) attributes: JsonMap,
    pub(crate) extras: JsonMap,
    pub(crate) repository: Repository,
    pub(crate) sealed: bool,
    pub(crate) is_valid_cache: bool,
    pub(crate) hash: Option<ContentHash>,
    pub(crate) cache_source: Option<Uuid>,
    pub(crate) ctime: Option<DateTime<Utc>>,
    pub(crate) mtime: Option<DateTime<Utc>>,
    pub(crate) incoming_cache: Vec<PendingLink>,
}

impl Node {
    pub fn builder(node_type: NodeType) -> NodeBuilder {
        NodeBuilder::new(node_type)
    }

    pub(crate) fn from_record(record: NodeRecord, backend_id: Uuid) -> Self {
        Self {
            backend_id,
            uuid: record.uuid,
            pk: Some(record.pk),
            node_type: record.node_type,
            type_string: record.type_string,
            process_type: record.process_type,
            label: record.label,
            description: record.description,
            user_email: record.user_email,
            attributes: record.attributes,
            extras: record.extras,
            repository: Repository::from_keys(record.repository),
            sealed: record.sealed,
            is_valid_cache: record.is_valid_cache,
            hash: record.hash,
            cache_source: record.cache_source,
            ctime: Some(record.ctime),
            mtime: Some(record.mtime),
            incoming_cache: Vec::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Backend primary key, once stored.
    pub fn pk(&self) -> Option<i64> {
        self.pk
    }

    /// Instance id of the backend this node belongs to.
    pub fn backend_id(&self) -> Uuid {
        self.backend_id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn type_string(&self) -> &str {
        &self.type_string
    }

    pub fn process_type(&self) -> Option<&str> {
        self.process_type.as_deref()
    }

    /// Identifier the caching configuration is resolved against.
    pub fn cache_identifier(&self) -> &str {
        self.process_type.as_deref().unwrap_or(&self.type_string)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn state(&self) -> NodeState {
        match (self.pk, self.sealed) {
            (None, _) => NodeState::Unstored,
            (Some(_), false) => NodeState::Stored,
            (Some(_), true) => NodeState::Sealed,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.pk.is_some()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn is_valid_cache(&self) -> bool {
        self.is_valid_cache
    }

    pub fn attributes(&self) -> &JsonMap {
        &self.attributes
    }

    pub fn get_attribute(&self, key: &str) -> ProvenanceResult<&Value> {
        self.attributes
            .get(key)
            .ok_or_else(|| ProvenanceError::MissingKey(format!("attribute `{}`", key)))
    }

    pub fn extras(&self) -> &JsonMap {
        &self.extras
    }

    pub fn get_extra(&self, key: &str) -> ProvenanceResult<&Value> {
        self.extras
            .get(key)
            .ok_or_else(|| ProvenanceError::MissingKey(format!("extra `{}`", key)))
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Content hash persisted with the node, if any.
    pub fn hash(&self) -> Option<&ContentHash> {
        self.hash.as_ref()
    }

    /// UUID of the node this one was cloned from through the cache.
    pub fn cache_source(&self) -> Option<Uuid> {
        self.cache_source
    }

    pub fn ctime(&self) -> Option<DateTime<Utc>> {
        self.ctime
    }

    pub fn mtime(&self) -> Option<DateTime<Utc>> {
        self.mtime
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pk {
            Some(pk) => write!(f, "{}<{}>", self.node_type, pk),
            None => write!(f, "{}<unstored {}>", self.node_type, self.uuid),
        }
    }
}

/// Builder for unstored nodes.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    node_type: NodeType,
    uuid: Option<Uuid>,
    type_string: Option<String>,
    process_type: Option<String>,
    label: String,
    description: String,
    user_email: Option<String>,
    attributes: JsonMap,
    extras: JsonMap,
    files: Vec<(String, Vec<u8>)>,
    is_valid_cache: bool,
}

impl NodeBuilder {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            uuid: None,
            type_string: None,
            process_type: None,
            label: String::new(),
            description: String::new(),
            user_email: None,
            attributes: JsonMap::new(),
            extras: JsonMap::new(),
            files: Vec::new(),
            is_valid_cache: true,
        }
    }

    /// Use a fixed UUID instead of a random one.
    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn type_string(mut self, type_string: impl Into<String>) -> Self {
        self.type_string = Some(type_string.into());
        self
    }

    pub fn process_type(mut self, process_type: impl Into<String>) -> Self {
        self.process_type = Some(process_type.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Owner of the node; defaults to the backend profile's user.
    pub fn user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    pub fn valid_cache(mut self, valid: bool) -> Self {
        self.is_valid_cache = valid;
        self
    }

    pub(crate) fn build(self, backend_id: Uuid, profile: &Profile) -> ProvenanceResult<Node> {
        for (key, value) in self.attributes.iter().chain(&self.extras) {
            validate_entry(key, value)?;
        }
        let mut repository = Repository::default();
        for (path, content) in self.files {
            repository.put(path, content)?;
        }

        Ok(Node {
            backend_id,
            uuid: self.uuid.unwrap_or_else(Uuid::new_v4),
            pk: None,
            node_type: self.node_type,
            type_string: self
                .type_string
                .unwrap_or_else(|| self.node_type.default_type_string().to_string()),
            process_type: self.process_type,
            label: self.label,
            description: self.description,
            user_email: self
                .user_email
                .unwrap_or_else(|| profile.default_user_email.clone()),
            attributes: self.attributes,
            extras: self.extras,
            repository,
            sealed: false,
            is_valid_cache: self.is_valid_cache,
            hash: None,
            cache_source: None,
            ctime: None,
            mtime: None,
            incoming_cache: Vec::new(),
        })
    }
}
