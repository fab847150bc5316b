//! Legality check for a proposed link.
//!
//! [`validate_link`] has no side effects beyond the lookups it performs.
//! It fails fast on the first violated rule, checking in this order:
//! backend, identity, self-link, sealed endpoints, label grammar, type
//! pair, unstored RETURN target, outdegree of the source, indegree of the
//! target.

use super::source::{ExistingLink, LinkLookup, LinkSource};
use crate::error::{ProvenanceError, ProvenanceResult};
use crate::node::Node;
use provenance_store::LinkDirection;
use provenance_types::{validate_link_label, Cardinality, LinkType};
use uuid::Uuid;

/// Accept `source --link_type/label--> target` or explain why not.
pub fn validate_link(
    lookup: &dyn LinkLookup,
    source: &Node,
    target: &Node,
    link_type: LinkType,
    label: &str,
) -> ProvenanceResult<()> {
    if source.backend_id() != target.backend_id() {
        return Err(ProvenanceError::InvalidValue(format!(
            "cannot link {} and {}: nodes belong to different backends",
            source, target
        )));
    }
    for node in [source, target] {
        if node.uuid().is_nil() {
            return Err(ProvenanceError::InvalidValue(format!(
                "{} has no identity",
                node
            )));
        }
    }
    if source.uuid() == target.uuid() {
        return Err(ProvenanceError::InvalidValue(format!(
            "cannot link {} to oneself",
            source
        )));
    }
    if source.is_sealed() {
        return Err(ProvenanceError::ModificationNotAllowed(format!(
            "cannot add outgoing {} link to sealed node {}",
            link_type, source
        )));
    }
    if target.is_sealed() {
        return Err(ProvenanceError::ModificationNotAllowed(format!(
            "cannot add incoming {} link to sealed node {}",
            link_type, target
        )));
    }

    validate_link_label(label)?;

    let rule = link_type.rule();
    if !rule.source.accepts(source.node_type()) || !rule.target.accepts(target.node_type()) {
        return Err(ProvenanceError::InvalidValue(format!(
            "{} links go from {} to {}, got {} to {}",
            link_type,
            rule.source,
            rule.target,
            source.node_type(),
            target.node_type()
        )));
    }

    if link_type == LinkType::Return && !target.is_stored() {
        return Err(ProvenanceError::InvalidValue(format!(
            "{} can only return data that is already stored, {} is not",
            source, target
        )));
    }

    let outgoing = lookup.existing_links(source, LinkDirection::Outgoing, &[link_type])?;
    if let Some(existing) = find_collision(rule.outdegree, &outgoing, label, target.uuid()) {
        return Err(ProvenanceError::InvalidValue(format!(
            "{} already has an outgoing {} link `{}` to {} ({} outdegree)",
            source, link_type, existing.label, existing.peer, rule.outdegree
        )));
    }

    let incoming = lookup.existing_links(target, LinkDirection::Incoming, &[link_type])?;
    if let Some(existing) = find_collision(rule.indegree, &incoming, label, source.uuid()) {
        return Err(ProvenanceError::InvalidValue(format!(
            "{} already has an incoming {} link `{}` from {} ({} indegree)",
            target, link_type, existing.label, existing.peer, rule.indegree
        )));
    }

    Ok(())
}

fn find_collision(
    cardinality: Cardinality,
    sources: &[LinkSource],
    label: &str,
    peer: Uuid,
) -> Option<ExistingLink> {
    sources.iter().flat_map(LinkSource::iter).find(|l| match cardinality {
        Cardinality::Unique => true,
        Cardinality::UniquePair => l.label == label,
        Cardinality::UniqueTriple => l.label == label && l.peer == peer,
    })
}
