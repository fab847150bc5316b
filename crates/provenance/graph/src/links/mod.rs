//! Link validation and link query results.

mod manager;
mod source;
mod triple;
mod validator;

pub use manager::{LinkManager, NestedLinks};
pub use source::{ExistingLink, LinkLookup, LinkSource};
pub use triple::LinkTriple;
pub use validator::validate_link;
