//! Node selection under topology constraints
//!
//! All selectors are deterministic first-match algorithms over the
//! inventory listing order: they return the first node or pair that
//! satisfies the constraint, not an optimal or randomized pairing.
//! Changing the listing order changes the selection. "No match" is
//! `None`; whether that skips or fails the enclosing test is decided by
//! the caller through [`require_node`].

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::inventory::NodeRecord;
use crate::predicates::{
    is_schedulable_linux_worker, is_schedulable_master, schedulable_linux_workers,
    schedulable_rhel_workers,
};

/// Zone name used for nodes without an availability-zone label
pub const NO_ZONE: &str = "noneAzCluster";

/// The caller's reaction to a selector finding nothing
///
/// Skipping means the environment does not support the scenario (e.g. a
/// single availability zone); failing means the environment is expected
/// to support it but does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingNodeAction {
    SkipTest,
    FailTest,
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("skipped: {0}")]
    SkipTest(String),
    #[error("{0}")]
    FailTest(String),
}

/// Escalates an empty selection according to the caller-chosen action.
pub fn require_node(
    node: Option<NodeRecord>,
    action: MissingNodeAction,
    reason: &str,
) -> Result<NodeRecord, SelectionError> {
    match node {
        Some(node) => Ok(node),
        None => Err(match action {
            MissingNodeAction::SkipTest => SelectionError::SkipTest(reason.to_owned()),
            MissingNodeAction::FailTest => SelectionError::FailTest(reason.to_owned()),
        }),
    }
}

/// Picks one schedulable worker, RHEL workers first.
///
/// Priority order: the first schedulable RHEL worker if any exist, the
/// single node of a single-node deployment, otherwise the first node of
/// the inventory satisfying the Linux-worker predicate.
pub fn one_schedulable_worker(nodes: &[NodeRecord]) -> Option<NodeRecord> {
    let rhel_workers = schedulable_rhel_workers(nodes);
    if let Some(worker) = rhel_workers.first() {
        debug!("picked the RHEL worker [{}]", worker.name);
        return Some(worker.clone());
    }
    if nodes.len() == 1 {
        return Some(nodes[0].clone());
    }
    nodes
        .iter()
        .find(|node| is_schedulable_linux_worker(node))
        .cloned()
}

/// Picks one schedulable master, or the single node of a single-node
/// deployment.
pub fn one_schedulable_master(nodes: &[NodeRecord]) -> Option<NodeRecord> {
    if nodes.len() == 1 {
        return Some(nodes[0].clone());
    }
    nodes
        .iter()
        .find(|node| is_schedulable_master(node))
        .cloned()
}

/// Two schedulable workers sharing one availability zone
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SameZonePair {
    pub workers: (NodeRecord, NodeRecord),
    pub zone: String,
}

/// Finds the first pair of schedulable Linux workers in the same zone.
///
/// Single linear pass: the first worker whose zone was already seen
/// closes the pair immediately. Workers without a zone label are grouped
/// under [`NO_ZONE`]. Returns `None` when no zone repeats.
pub fn two_workers_same_zone(nodes: &[NodeRecord]) -> Option<SameZonePair> {
    let workers = schedulable_linux_workers(nodes);
    let mut first_worker_in_zone: BTreeMap<String, NodeRecord> = BTreeMap::new();
    for worker in workers {
        let zone = if worker.available_zone.is_empty() {
            NO_ZONE.to_owned()
        } else {
            worker.available_zone.clone()
        };
        if let Some(earlier) = first_worker_in_zone.get(&zone) {
            info!(
                "schedulable workers [{}] and [{}] share the zone [{}]",
                worker.name, earlier.name, zone
            );
            return Some(SameZonePair {
                workers: (worker, earlier.clone()),
                zone,
            });
        }
        first_worker_in_zone.insert(zone, worker);
    }
    info!("no availability zone holds two schedulable linux workers");
    None
}

/// Finds the first pair of schedulable Linux workers in different zones.
///
/// The first eligible worker is the anchor; its zone is compared against
/// every subsequent worker in order. Returns `None` with fewer than two
/// eligible workers or when all zones are equal.
pub fn two_workers_different_zones(nodes: &[NodeRecord]) -> Option<(NodeRecord, NodeRecord)> {
    let workers = schedulable_linux_workers(nodes);
    let (first, rest) = workers.split_first()?;
    let other = rest
        .iter()
        .find(|worker| worker.available_zone != first.available_zone)?;
    info!(
        "schedulable workers [{}] and [{}] are in different zones",
        first.name, other.name
    );
    Some((first.clone(), other.clone()))
}
