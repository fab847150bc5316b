//! Storage-level uniqueness constraints for links.
//!
//! These mirror the cardinality rule of each link type. The graph layer
//! validates links before inserting them; the constraints here still reject
//! a violating row when two writers race past that check.

use crate::error::{StorageError, StorageResult};
use crate::model::{LinkRecord, NewLink};
use provenance_types::Cardinality;

/// Reject `new` if it collides with any of `existing`.
pub fn check_link<'a>(
    existing: impl IntoIterator<Item = &'a LinkRecord>,
    new: &NewLink,
) -> StorageResult<()> {
    if new.source == new.target {
        return Err(StorageError::InvariantViolation(format!(
            "self link on node {}",
            new.source
        )));
    }

    let rule = new.link_type.rule();
    for link in existing {
        if link.link_type != new.link_type {
            continue;
        }
        if link.source == new.source
            && collides(rule.outdegree, link, new, link.target == new.target)
        {
            return Err(StorageError::Conflict(format!(
                "{} outdegree ({}) of node {} already used by link {} `{}`",
                new.link_type, rule.outdegree, new.source, link.id, link.label
            )));
        }
        if link.target == new.target
            && collides(rule.indegree, link, new, link.source == new.source)
        {
            return Err(StorageError::Conflict(format!(
                "{} indegree ({}) of node {} already used by link {} `{}`",
                new.link_type, rule.indegree, new.target, link.id, link.label
            )));
        }
    }
    Ok(())
}

fn collides(cardinality: Cardinality, link: &LinkRecord, new: &NewLink, same_peer: bool) -> bool {
    match cardinality {
        Cardinality::Unique => true,
        Cardinality::UniquePair => link.label == new.label,
        Cardinality::UniqueTriple => link.label == new.label && same_peer,
    }
}
