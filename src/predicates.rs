//! Pure classification predicates over a [`NodeRecord`]

use crate::inventory::{NodeRecord, ReadyStatus};

/// A worker that accepts storage test workloads: schedulable, Linux,
/// holding the worker role but neither infra nor edge, without a
/// `NoSchedule` taint and Ready.
pub fn is_schedulable_linux_worker(node: &NodeRecord) -> bool {
    node.scheduleable
        && node.os_type == "linux"
        && node.has_role("worker")
        && !node.has_role("infra")
        && !node.has_role("edge")
        && node.is_no_schedule_taints_empty
        && node.ready_status == ReadyStatus::True
}

/// Like [`is_schedulable_linux_worker`] but restricted to RHEL workers.
pub fn is_schedulable_rhel_worker(node: &NodeRecord) -> bool {
    node.os_id == "rhel" && is_schedulable_linux_worker(node)
}

pub fn is_schedulable_master(node: &NodeRecord) -> bool {
    node.scheduleable
        && node.os_type == "linux"
        && node.has_role("master")
        && node.ready_status == ReadyStatus::True
}

/// All schedulable Linux workers, in inventory order.
pub fn schedulable_linux_workers(nodes: &[NodeRecord]) -> Vec<NodeRecord> {
    filtered(nodes, is_schedulable_linux_worker)
}

/// All schedulable RHEL workers, in inventory order.
pub fn schedulable_rhel_workers(nodes: &[NodeRecord]) -> Vec<NodeRecord> {
    filtered(nodes, is_schedulable_rhel_worker)
}

/// A single-node deployment co-locates all roles on its one node, so the
/// predicate is bypassed there and the node is returned unconditionally.
fn filtered(nodes: &[NodeRecord], predicate: fn(&NodeRecord) -> bool) -> Vec<NodeRecord> {
    if nodes.len() == 1 {
        return nodes.to_vec();
    }
    nodes.iter().filter(|node| predicate(node)).cloned().collect()
}
