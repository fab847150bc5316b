//! Fluent filters used to query links and nodes from a backend.

use crate::model::{LinkRecord, NodeRecord};
use provenance_types::{ContentHash, LinkType, NodeType};
use serde::{Deserialize, Serialize};

/// Which side of the anchor node a link lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkDirection {
    /// Links whose target is the anchor.
    Incoming,
    /// Links whose source is the anchor.
    Outgoing,
}

/// Link query anchored on one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkFilter {
    pub node: i64,
    pub direction: LinkDirection,
    /// Empty means every link type.
    pub link_types: Vec<LinkType>,
    pub label: Option<String>,
    /// Restrict to links whose other endpoint is this node.
    pub peer: Option<i64>,
}

impl LinkFilter {
    pub fn incoming(node: i64) -> Self {
        Self::new(node, LinkDirection::Incoming)
    }

    pub fn outgoing(node: i64) -> Self {
        Self::new(node, LinkDirection::Outgoing)
    }

    pub fn new(node: i64, direction: LinkDirection) -> Self {
        Self {
            node,
            direction,
            link_types: Vec::new(),
            label: None,
            peer: None,
        }
    }

    pub fn link_type(mut self, link_type: LinkType) -> Self {
        self.link_types.push(link_type);
        self
    }

    pub fn link_types(mut self, link_types: impl IntoIterator<Item = LinkType>) -> Self {
        self.link_types.extend(link_types);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn peer(mut self, peer: i64) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn matches(&self, link: &LinkRecord) -> bool {
        let (anchor, other) = match self.direction {
            LinkDirection::Incoming => (link.target, link.source),
            LinkDirection::Outgoing => (link.source, link.target),
        };
        anchor == self.node
            && (self.link_types.is_empty() || self.link_types.contains(&link.link_type))
            && self.label.as_ref().map_or(true, |l| *l == link.label)
            && self.peer.map_or(true, |p| p == other)
    }
}

/// Node query used to locate cache candidates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeQuery {
    pub hash: Option<ContentHash>,
    pub type_string: Option<String>,
    pub node_types: Vec<NodeType>,
    pub valid_cache_only: bool,
}

impl NodeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(mut self, hash: ContentHash) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn type_string(mut self, type_string: impl Into<String>) -> Self {
        self.type_string = Some(type_string.into());
        self
    }

    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_types.push(node_type);
        self
    }

    pub fn valid_cache_only(mut self) -> Self {
        self.valid_cache_only = true;
        self
    }

    pub fn matches(&self, node: &NodeRecord) -> bool {
        self.hash.as_ref().map_or(true, |h| node.hash.as_ref() == Some(h))
            && self
                .type_string
                .as_ref()
                .map_or(true, |t| *t == node.type_string)
            && (self.node_types.is_empty() || self.node_types.contains(&node.node_type))
            && (!self.valid_cache_only || node.is_valid_cache)
    }
}
