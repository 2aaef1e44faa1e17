pub use super::fakes::{Attempt, FailingClusterQuery, ScriptedSession, StaticClusterQuery};
pub use super::fixtures::{node_list_json, NodeJson};

pub use std::time::Duration;

pub use rstest::rstest;

pub use storage_node_topology::executor::{
    RemoteExecutor, RemoteSession, SessionNamespace, FALLBACK_NAMESPACE,
};
pub use storage_node_topology::inventory::{
    build_inventory, ClusterQuery, NodeRecord, ReadyStatus, SelectionContext,
};
pub use storage_node_topology::poll::{assert_eventually, poll_until, RetryPolicy};
pub use storage_node_topology::predicates::*;
pub use storage_node_topology::selectors::*;

/// Policy small enough to keep the executor and poll tests fast
#[allow(dead_code)]
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(Duration::from_millis(5), Duration::from_millis(50))
}

/// Inventory built from the given node fixtures with the given provider
#[allow(dead_code)]
pub fn inventory_of(provider: &str, nodes: &[NodeJson]) -> Vec<NodeRecord> {
    let query = StaticClusterQuery::new(node_list_json(nodes));
    let context = SelectionContext::new(provider);
    build_inventory(&query, &context).expect("inventory could not be built")
}
