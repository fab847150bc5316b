//! Uniform view over links that exist either only in memory or in the
//! backend.

use crate::error::ProvenanceResult;
use crate::node::Node;
use provenance_store::{LinkDirection, LinkRecord};
use provenance_types::LinkType;
use uuid::Uuid;

/// An existing link as seen from an anchor node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistingLink {
    /// UUID of the node at the other end.
    pub peer: Uuid,
    pub link_type: LinkType,
    pub label: String,
}

/// Where a set of existing links comes from.
#[derive(Clone, Debug)]
pub enum LinkSource {
    /// Links cached on unstored targets, in insertion order.
    Pending(Vec<ExistingLink>),
    /// Backend rows, in row id order.
    Stored {
        direction: LinkDirection,
        rows: Vec<LinkRecord>,
    },
}

impl LinkSource {
    pub fn iter(&self) -> Box<dyn Iterator<Item = ExistingLink> + '_> {
        match self {
            Self::Pending(links) => Box::new(links.iter().cloned()),
            Self::Stored { direction, rows } => {
                let direction = *direction;
                Box::new(rows.iter().map(move |row| ExistingLink {
                    peer: match direction {
                        LinkDirection::Incoming => row.source_uuid,
                        LinkDirection::Outgoing => row.target_uuid,
                    },
                    link_type: row.link_type,
                    label: row.label.clone(),
                }))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Pending(links) => links.len(),
            Self::Stored { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read access to the existing links of a node, cached and stored alike.
pub trait LinkLookup {
    /// Links of `node` in `direction`; an empty `link_types` means all.
    fn existing_links(
        &self,
        node: &Node,
        direction: LinkDirection,
        link_types: &[LinkType],
    ) -> ProvenanceResult<Vec<LinkSource>>;
}
