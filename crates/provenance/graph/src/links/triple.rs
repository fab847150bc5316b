use crate::node::NodeHandle;
use provenance_types::LinkType;
use std::fmt;

/// A link seen from one of its endpoints: the node at the other end, the
/// link type and the label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkTriple {
    pub node: NodeHandle,
    pub link_type: LinkType,
    pub link_label: String,
}

impl LinkTriple {
    pub fn new(node: NodeHandle, link_type: LinkType, link_label: impl Into<String>) -> Self {
        Self {
            node,
            link_type,
            link_label: link_label.into(),
        }
    }
}

impl fmt::Display for LinkTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}` {}", self.link_type, self.link_label, self.node)
    }
}
