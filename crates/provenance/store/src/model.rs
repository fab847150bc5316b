use chrono::{DateTime, Utc};
use provenance_types::{ContentHash, LinkType, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// JSON-typed attribute or extra column.
pub type JsonMap = BTreeMap<String, Value>;

/// Durable row of a stored node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub pk: i64,
    pub uuid: Uuid,
    pub node_type: NodeType,
    pub type_string: String,
    pub process_type: Option<String>,
    pub label: String,
    pub description: String,
    pub user_email: String,
    pub attributes: JsonMap,
    pub extras: JsonMap,
    /// Repository file paths mapped to object-store keys.
    pub repository: BTreeMap<String, String>,
    pub sealed: bool,
    pub is_valid_cache: bool,
    pub hash: Option<ContentHash>,
    /// UUID of the node this one was cloned from through the cache.
    pub cache_source: Option<Uuid>,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
}

impl NodeRecord {
    /// A process is finished once its state attribute says so.
    pub fn is_finished(&self) -> bool {
        self.attributes
            .get("process_state")
            .and_then(Value::as_str)
            .is_some_and(|state| state == "finished")
    }
}

/// Everything needed to insert a node; the backend assigns pk and times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDraft {
    pub uuid: Uuid,
    pub node_type: NodeType,
    pub type_string: String,
    pub process_type: Option<String>,
    pub label: String,
    pub description: String,
    pub user_email: String,
    pub attributes: JsonMap,
    pub extras: JsonMap,
    pub repository: BTreeMap<String, String>,
    pub sealed: bool,
    pub is_valid_cache: bool,
    pub hash: Option<ContentHash>,
    pub cache_source: Option<Uuid>,
}

impl NodeDraft {
    pub fn into_record(self, pk: i64, now: DateTime<Utc>) -> NodeRecord {
        NodeRecord {
            pk,
            uuid: self.uuid,
            node_type: self.node_type,
            type_string: self.type_string,
            process_type: self.process_type,
            label: self.label,
            description: self.description,
            user_email: self.user_email,
            attributes: self.attributes,
            extras: self.extras,
            repository: self.repository,
            sealed: self.sealed,
            is_valid_cache: self.is_valid_cache,
            hash: self.hash,
            cache_source: self.cache_source,
            ctime: now,
            mtime: now,
        }
    }
}

impl From<&NodeRecord> for NodeDraft {
    /// Copy of a stored row under a fresh UUID, as used for clones.
    fn from(record: &NodeRecord) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            node_type: record.node_type,
            type_string: record.type_string.clone(),
            process_type: record.process_type.clone(),
            label: record.label.clone(),
            description: record.description.clone(),
            user_email: record.user_email.clone(),
            attributes: record.attributes.clone(),
            extras: record.extras.clone(),
            repository: record.repository.clone(),
            sealed: record.sealed,
            is_valid_cache: record.is_valid_cache,
            hash: record.hash.clone(),
            cache_source: None,
        }
    }
}

/// Durable row of a link, joined with the UUIDs of both endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: i64,
    pub source: i64,
    pub source_uuid: Uuid,
    pub target: i64,
    pub target_uuid: Uuid,
    pub link_type: LinkType,
    pub label: String,
}

/// A link to insert, addressed by node pks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLink {
    pub source: i64,
    pub target: i64,
    pub link_type: LinkType,
    pub label: String,
}

impl NewLink {
    pub fn new(source: i64, target: i64, link_type: LinkType, label: impl Into<String>) -> Self {
        Self {
            source,
            target,
            link_type,
            label: label.into(),
        }
    }
}

/// Single-field update applied to a stored node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePatch {
    SetAttribute { key: String, value: Value },
    DeleteAttribute { key: String },
    SetExtra { key: String, value: Value },
    DeleteExtra { key: String },
    Seal,
    SetValidCache(bool),
    SetHash(Option<ContentHash>),
}

impl NodePatch {
    /// Whether the patch touches the attribute column.
    pub fn modifies_attributes(&self) -> bool {
        matches!(self, Self::SetAttribute { .. } | Self::DeleteAttribute { .. })
    }
}
