//! # provenance-graph
//!
//! Session layer of the provenance graph. A [`ProvenanceGraph`] owns the
//! nodes it has created or loaded and keeps links into unstored nodes
//! cached until those nodes are stored.
//!
//! - every link is checked by [`validate_link`] against the type table and
//!   the cardinality rules before it is cached or inserted
//! - storing a node stores its unstored sources first, then flushes its
//!   cached links in the same transaction
//! - with caching enabled, a node whose content hash matches a usable stored
//!   node takes over that node's content and outputs instead of rerunning
//!
//! ```no_run
//! use provenance_graph::{ProvenanceGraph, Node};
//! use provenance_store::InMemoryBackend;
//! use provenance_types::{LinkType, NodeType};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), provenance_graph::ProvenanceError> {
//! let mut graph = ProvenanceGraph::new(Arc::new(InMemoryBackend::default()));
//! let x = graph.add(Node::builder(NodeType::Data).attribute("value", 2))?;
//! let calc = graph.create(NodeType::CalcFunction)?;
//! graph.add_incoming(calc, x, LinkType::InputCalc, "x")?;
//! graph.store(calc)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod caching;
pub mod config;
mod delete;
pub mod error;
mod graph;
pub mod links;
pub mod node;

pub use caching::{hash_value, CachingConfig};
pub use config::ProvenanceConfig;
pub use delete::{DeleteReport, DeleteRules};
pub use error::{ConfigError, HashingError, ProvenanceError, ProvenanceResult};
pub use graph::ProvenanceGraph;
pub use links::{
    validate_link, ExistingLink, LinkLookup, LinkManager, LinkSource, LinkTriple, NestedLinks,
};
pub use node::{Node, NodeBuilder, NodeHandle, NodeState, Repository, RepositoryFile};
