use super::triple::LinkTriple;
use crate::error::{ProvenanceError, ProvenanceResult};
use crate::node::NodeHandle;
use provenance_types::{split_namespaces, LinkType};

/// Read-only view over the result of a link query.
///
/// Order is preserved: stored links by row id, then links still cached in
/// memory in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkManager {
    triples: Vec<LinkTriple>,
}

impl LinkManager {
    pub fn new(triples: Vec<LinkTriple>) -> Self {
        Self { triples }
    }

    pub fn all(&self) -> &[LinkTriple] {
        &self.triples
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkTriple> {
        self.triples.iter()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// The only link; fails when there are none or several.
    pub fn one(&self) -> ProvenanceResult<&LinkTriple> {
        match self.triples.as_slice() {
            [triple] => Ok(triple),
            [] => Err(ProvenanceError::InvalidValue(
                "expected exactly one link, found none".to_string(),
            )),
            many => Err(ProvenanceError::InvalidValue(format!(
                "expected exactly one link, found {}",
                many.len()
            ))),
        }
    }

    pub fn first(&self) -> Option<&LinkTriple> {
        self.triples.first()
    }

    pub fn all_nodes(&self) -> Vec<NodeHandle> {
        self.triples.iter().map(|t| t.node).collect()
    }

    pub fn all_link_labels(&self) -> Vec<&str> {
        self.triples.iter().map(|t| t.link_label.as_str()).collect()
    }

    pub fn all_link_pairs(&self) -> Vec<(LinkType, &str)> {
        self.triples
            .iter()
            .map(|t| (t.link_type, t.link_label.as_str()))
            .collect()
    }

    /// Node of the single link carrying `label`.
    pub fn get_node_by_label(&self, label: &str) -> ProvenanceResult<NodeHandle> {
        let mut matches = self.triples.iter().filter(|t| t.link_label == label);
        match (matches.next(), matches.next()) {
            (Some(triple), None) => Ok(triple.node),
            (None, _) => Err(ProvenanceError::NotExistent(format!(
                "no link with label `{}`",
                label
            ))),
            (Some(_), Some(_)) => Err(ProvenanceError::MultipleObjects(format!(
                "more than one link with label `{}`",
                label
            ))),
        }
    }

    /// Rebuild the namespace tree encoded in the labels by the `__`
    /// separator. With `sort`, every level is ordered by key; otherwise
    /// first-seen order is kept.
    pub fn nested(&self, sort: bool) -> ProvenanceResult<NestedLinks> {
        let mut root: Vec<(String, NestedLinks)> = Vec::new();

        for triple in &self.triples {
            let label = triple.link_label.as_str();
            let (namespaces, leaf) = split_namespaces(label);

            let mut level = &mut root;
            for namespace in namespaces {
                let pos = match level.iter().position(|(k, _)| k == namespace) {
                    Some(pos) => pos,
                    None => {
                        level.push((namespace.to_string(), NestedLinks::Namespace(Vec::new())));
                        level.len() - 1
                    }
                };
                level = match &mut level[pos].1 {
                    NestedLinks::Namespace(children) => children,
                    NestedLinks::Node(_) => {
                        return Err(ProvenanceError::DuplicateKey(format!(
                            "namespace `{}` of `{}` is already a link label",
                            namespace, label
                        )))
                    }
                };
            }

            if level.iter().any(|(k, _)| k == leaf) {
                return Err(ProvenanceError::DuplicateKey(format!(
                    "`{}` collides with an existing key `{}`",
                    label, leaf
                )));
            }
            level.push((leaf.to_string(), NestedLinks::Node(triple.node)));
        }

        let mut tree = NestedLinks::Namespace(root);
        if sort {
            tree.sort();
        }
        Ok(tree)
    }
}

impl IntoIterator for LinkManager {
    type Item = LinkTriple;
    type IntoIter = std::vec::IntoIter<LinkTriple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

/// Namespace tree rebuilt from flattened link labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NestedLinks {
    Node(NodeHandle),
    Namespace(Vec<(String, NestedLinks)>),
}

impl NestedLinks {
    pub fn get(&self, key: &str) -> Option<&NestedLinks> {
        match self {
            Self::Namespace(children) => children.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeHandle> {
        match self {
            Self::Node(handle) => Some(*handle),
            Self::Namespace(_) => None,
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Namespace(children) => children.iter().map(|(k, _)| k.as_str()).collect(),
            Self::Node(_) => Vec::new(),
        }
    }

    fn sort(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Self::Namespace(children) = node {
                children.sort_by(|a, b| a.0.cmp(&b.0));
                stack.extend(children.iter_mut().map(|(_, v)| v));
            }
        }
    }
}
