//! Storage contract for the provenance graph.
//!
//! The graph layer talks to persistence only through [`StorageBackend`] and
//! the [`Transaction`]s it opens:
//! - nodes are inserted once and afterwards patched field by field
//! - links are rows keyed by `(source, target, type, label)` and guarded by
//!   the uniqueness constraints of their link type
//! - repository objects are content-addressed blobs
//!
//! [`InMemoryBackend`] is the deterministic reference implementation.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod backend;
pub mod constraints;
mod error;
pub mod memory;
mod model;
mod profile;
pub mod query;

pub use backend::{with_transaction, StorageBackend, Transaction};
pub use error::{StorageError, StorageResult};
pub use memory::{InMemoryBackend, InMemoryTransaction};
pub use model::{JsonMap, LinkRecord, NewLink, NodeDraft, NodePatch, NodeRecord};
pub use profile::Profile;
pub use query::{LinkDirection, LinkFilter, NodeQuery};
