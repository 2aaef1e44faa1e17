//! On-node state verifications built on the poll guard
//!
//! Each check supplies its own command, retry policy and failure message
//! to [`assert_eventually`]; a timeout is a hard failure of the enclosing
//! test.

use std::time::Duration;

use crate::executor::{RemoteExecutor, RemoteSession};
use crate::inventory::{build_inventory, ClusterQuery, ReadyStatus, SelectionContext};
use crate::poll::{assert_eventually, RetryPolicy};

pub const MOUNT_RETRY: RetryPolicy =
    RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(60));
pub const UNMOUNT_RETRY: RetryPolicy =
    RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(180));
pub const DETACH_RETRY: RetryPolicy =
    RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(120));
pub const NODE_READY_RETRY: RetryPolicy =
    RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(180));

/// Verifies that the volume is mounted on the node.
pub fn assert_volume_mounted_on_node<S: RemoteSession>(
    executor: &RemoteExecutor<'_, S>,
    volume_name: &str,
    node_name: &str,
) {
    let command = format!("mount | grep {}", volume_name);
    assert_eventually(
        MOUNT_RETRY,
        &format!(
            "volume [{}] was not mounted on node [{}] in time",
            volume_name, node_name
        ),
        || Ok(executor.execute(node_name, &command).is_ok()),
    );
}

/// Verifies that the volume is no longer mounted on the node.
pub fn assert_volume_not_mounted_on_node<S: RemoteSession>(
    executor: &RemoteExecutor<'_, S>,
    volume_name: &str,
    node_name: &str,
) {
    let command = format!("mount | grep -c \"{}\" || true", volume_name);
    assert_eventually(
        UNMOUNT_RETRY,
        &format!(
            "volume [{}] was not unmounted from node [{}] in time",
            volume_name, node_name
        ),
        || {
            let count = executor.execute(node_name, &command)?;
            Ok(count == "0")
        },
    );
}

/// Verifies that the volume is detached from the node.
pub fn assert_volume_detached_from_node<S: RemoteSession>(
    executor: &RemoteExecutor<'_, S>,
    volume_name: &str,
    node_name: &str,
) {
    let command = format!("lsblk | grep -c \"{}\" || true", volume_name);
    assert_eventually(
        DETACH_RETRY,
        &format!(
            "volume [{}] was not detached from node [{}] in time",
            volume_name, node_name
        ),
        || {
            let count = executor.execute(node_name, &command)?;
            Ok(count == "0")
        },
    );
}

/// Verifies that the volume's mount entry on the node contains `content`
/// (e.g. a mount option or filesystem type).
pub fn assert_mount_output_contains<S: RemoteSession>(
    executor: &RemoteExecutor<'_, S>,
    volume_name: &str,
    node_name: &str,
    content: &str,
) {
    let command = format!("mount | grep {}", volume_name);
    assert_eventually(
        MOUNT_RETRY,
        &format!(
            "mount entry of volume [{}] on node [{}] does not contain [{}]",
            volume_name, node_name, content
        ),
        || {
            let output = executor.execute(node_name, &command)?;
            Ok(output.contains(content))
        },
    );
}

/// Waits until the node is schedulable and Ready again.
///
/// The inventory is rebuilt from a fresh listing on every attempt.
pub fn wait_node_available(
    query: &dyn ClusterQuery,
    context: &SelectionContext,
    node_name: &str,
) {
    assert_eventually(
        NODE_READY_RETRY,
        &format!("node [{}] did not become ready to use in time", node_name),
        || {
            let nodes = build_inventory(query, context)?;
            Ok(nodes.iter().any(|node| {
                node.name == node_name
                    && node.scheduleable
                    && node.ready_status == ReadyStatus::True
            }))
        },
    );
}
