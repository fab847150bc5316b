//! Node deletion that keeps the provenance record consistent.

use crate::error::{ProvenanceError, ProvenanceResult};
use crate::graph::ProvenanceGraph;
use crate::links::{LinkLookup, LinkSource};
use crate::node::NodeHandle;
use provenance_store::{with_transaction, LinkDirection, LinkFilter, LinkRecord};
use provenance_types::LinkType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use uuid::Uuid;

/// Optional traversal rules for [`ProvenanceGraph::delete_nodes`].
///
/// INPUT links are always followed forward, CREATE and CALL links always
/// backward, and RETURN links never.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteRules {
    /// Delete the data created by a deleted calculation.
    pub create_forward: bool,
    /// Delete calculations called by a deleted workflow.
    pub call_calc_forward: bool,
    /// Delete workflows called by a deleted workflow.
    pub call_work_forward: bool,
}

impl Default for DeleteRules {
    fn default() -> Self {
        Self {
            create_forward: true,
            call_calc_forward: true,
            call_work_forward: true,
        }
    }
}

impl DeleteRules {
    fn follows_forward(&self, link_type: LinkType) -> bool {
        match link_type {
            LinkType::InputCalc | LinkType::InputWork => true,
            LinkType::Create => self.create_forward,
            LinkType::CallCalc => self.call_calc_forward,
            LinkType::CallWork => self.call_work_forward,
            LinkType::Return => false,
        }
    }

    fn follows_backward(&self, link_type: LinkType) -> bool {
        matches!(
            link_type,
            LinkType::Create | LinkType::CallCalc | LinkType::CallWork
        )
    }
}

/// What a bulk deletion removed, or would remove on a dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Deleted nodes, ordered by pk.
    pub nodes: Vec<Uuid>,
    pub links: Vec<LinkRecord>,
    pub dry_run: bool,
}

impl ProvenanceGraph {
    /// Delete a single node that has no links at all.
    pub fn delete_node(&mut self, handle: NodeHandle) -> ProvenanceResult<()> {
        let node = self.node(handle)?;
        let mut count = 0;
        for direction in [LinkDirection::Incoming, LinkDirection::Outgoing] {
            count += self
                .existing_links(node, direction, &[])?
                .iter()
                .map(LinkSource::len)
                .sum::<usize>();
        }
        if count > 0 {
            return Err(ProvenanceError::InvalidValue(format!(
                "cannot delete {}: it still has {} link(s)",
                node, count
            )));
        }

        if let Some(pk) = node.pk() {
            with_transaction::<_, ProvenanceError, _>(self.backend().as_ref(), |txn| {
                Ok(txn.delete_node(pk)?)
            })?;
        }
        debug!(node = %handle, "Deleted node");
        self.evict(handle);
        Ok(())
    }

    /// Delete `handles` together with every node that must go with them,
    /// removing all their links first, in one transaction.
    pub fn delete_nodes(
        &mut self,
        handles: &[NodeHandle],
        rules: DeleteRules,
        dry_run: bool,
    ) -> ProvenanceResult<DeleteReport> {
        let mut pks = BTreeSet::new();
        let mut worklist = Vec::new();
        for &handle in handles {
            let node = self.node(handle)?;
            let pk = node.pk().ok_or_else(|| {
                ProvenanceError::InvalidValue(format!("{} is not stored", node))
            })?;
            if pks.insert(pk) {
                worklist.push(pk);
            }
        }

        let backend = self.backend().clone();
        let mut links: BTreeMap<i64, LinkRecord> = BTreeMap::new();
        while let Some(pk) = worklist.pop() {
            let outgoing = backend.query_links(&LinkFilter::outgoing(pk))?;
            let incoming = backend.query_links(&LinkFilter::incoming(pk))?;

            let forward = outgoing
                .iter()
                .filter(|l| rules.follows_forward(l.link_type))
                .map(|l| l.target);
            let backward = incoming
                .iter()
                .filter(|l| rules.follows_backward(l.link_type))
                .map(|l| l.source);
            for next in forward.chain(backward) {
                if pks.insert(next) {
                    worklist.push(next);
                }
            }
            links.extend(outgoing.into_iter().chain(incoming).map(|l| (l.id, l)));
        }

        for &pk in &pks {
            let Some(handle) = self.handle_of_pk(pk) else {
                continue;
            };
            let pending = self.pending_outgoing(handle, |_| true);
            if let Some(link) = pending.first() {
                return Err(ProvenanceError::InvalidValue(format!(
                    "cannot delete {}: unstored node {} has a cached {} link '{}' from it",
                    self.node(handle)?,
                    link.peer,
                    link.link_type,
                    link.label
                )));
            }
        }

        let mut nodes = Vec::with_capacity(pks.len());
        for &pk in &pks {
            let record = backend
                .get_node(pk)?
                .ok_or_else(|| ProvenanceError::NotExistent(format!("node {} vanished", pk)))?;
            nodes.push(record.uuid);
        }
        let report = DeleteReport {
            nodes,
            links: links.into_values().collect(),
            dry_run,
        };

        if !dry_run {
            with_transaction::<_, ProvenanceError, _>(backend.as_ref(), |txn| {
                for link in &report.links {
                    txn.delete_link(link.id)?;
                }
                for &pk in &pks {
                    txn.delete_node(pk)?;
                }
                Ok(())
            })?;
            for &pk in &pks {
                if let Some(handle) = self.handle_of_pk(pk) {
                    self.evict(handle);
                }
            }
        }

        info!(
            nodes = report.nodes.len(),
            links = report.links.len(),
            dry_run,
            "Deleted nodes"
        );
        Ok(report)
    }
}
