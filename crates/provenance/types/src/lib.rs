#![deny(unsafe_code)]
//! # provenance-types
//!
//! Shared vocabulary of the provenance graph: the closed node type
//! hierarchy, the link type table with its cardinality rules, the link-label
//! and attribute-key grammars, and the content hash used for caching.
//!
//! ## Link rules
//!
//! ```text
//! link_type   source       target       outdegree      indegree
//! CALL_CALC   Workflow     Calculation  unique_triple  unique
//! CALL_WORK   Workflow     Workflow     unique_triple  unique
//! CREATE      Calculation  Data         unique_pair    unique
//! INPUT_CALC  Data         Calculation  unique_triple  unique_pair
//! INPUT_WORK  Data         Workflow     unique_triple  unique_pair
//! RETURN      Workflow     Data         unique_pair    unique_triple
//! ```

pub mod error;
pub mod hash;
pub mod key;
pub mod label;
pub mod link_type;
pub mod node_type;

pub use error::{ContentHashError, KeyError, LabelError, ParseError};
pub use hash::ContentHash;
pub use key::{validate_key, FIELD_SEPARATOR};
pub use label::{split_namespaces, validate_link_label, NAMESPACE_SEPARATOR};
pub use link_type::{Cardinality, LinkRule, LinkType};
pub use node_type::{NodeCapability, NodeType};
