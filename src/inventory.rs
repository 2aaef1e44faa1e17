//! Normalized inventory of the cluster nodes
//!
//! [`build_inventory`] fetches the node list once as a single JSON
//! document, deserializes it into typed [`Node`] values and derives one
//! immutable [`NodeRecord`] per node. Every call produces entirely new
//! records; nothing is cached across calls.
//!
//! Missing fields are not validated; they end up as zero values (empty
//! string, empty role set, [`ReadyStatus::Unknown`]). Only a document
//! that is not a node list at all is an error.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Node, NodeSpec, NodeStatus};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Deserialize;
use tracing::debug;

pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";
pub const AWS_EBS_ZONE_LABEL: &str = "topology.ebs.csi.aws.com/zone";
pub const INSTANCE_TYPE_LABEL: &str = "node.kubernetes.io/instance-type";
pub const OS_LABEL: &str = "kubernetes.io/os";
pub const OS_ID_LABEL: &str = "node.openshift.io/os_id";
pub const ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

const EPHEMERAL_STORAGE: &str = "ephemeral-storage";

/// Read-only access to the cluster node listing
pub trait ClusterQuery {
    /// Returns the full node list as a single JSON document.
    fn list_nodes_json(&self) -> Result<String>;
}

/// Caller-provided context for inventory construction
///
/// Replaces ambient shared state: the active cloud provider is passed in
/// explicitly because the zone-label fallback only applies on AWS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionContext {
    pub cloud_provider: String,
}

impl SelectionContext {
    pub fn new<S: Into<String>>(cloud_provider: S) -> SelectionContext {
        SelectionContext {
            cloud_provider: cloud_provider.into(),
        }
    }
}

/// Status of the node's `Ready` condition
///
/// `Unknown` also covers a node without a `Ready` condition, e.g. one
/// that is powered off or disconnected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyStatus {
    True,
    False,
    Unknown,
}

impl ReadyStatus {
    fn from_condition(status: &str) -> ReadyStatus {
        match status {
            "True" => ReadyStatus::True,
            "False" => ReadyStatus::False,
            _ => ReadyStatus::Unknown,
        }
    }
}

/// Snapshot of one cluster node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: String,
    pub instance_id: String,
    pub instance_type: String,
    pub available_zone: String,
    pub os_type: String,
    pub os_id: String,
    pub os_image: String,
    pub architecture: String,
    pub role: BTreeSet<String>,
    pub scheduleable: bool,
    pub ready_status: ReadyStatus,
    pub allocatable_ephemeral_storage: String,
    pub ephemeral_storage_capacity: String,
    /// False iff at least one taint has the effect `NoSchedule`;
    /// `PreferNoSchedule` taints are informational only.
    pub is_no_schedule_taints_empty: bool,
}

impl NodeRecord {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.contains(role)
    }
}

#[derive(Deserialize)]
struct NodeListDocument {
    #[serde(default)]
    items: Vec<Node>,
}

/// Builds the inventory from a single node listing.
///
/// The records are in the listing order of the underlying query; the
/// selectors rely on that order for their first-match semantics. A
/// failing query or a malformed document is an error, there are no
/// partial results.
pub fn build_inventory(
    query: &dyn ClusterQuery,
    context: &SelectionContext,
) -> Result<Vec<NodeRecord>> {
    let raw = query
        .list_nodes_json()
        .context("Node listing could not be retrieved")?;
    let document: NodeListDocument =
        serde_json::from_str(&raw).context("Node listing is not a well-formed node list")?;
    let nodes = document
        .items
        .iter()
        .map(|node| node_record(node, context))
        .collect();
    Ok(nodes)
}

fn node_record(node: &Node, context: &SelectionContext) -> NodeRecord {
    let no_labels = BTreeMap::new();
    let labels = node.metadata.labels.as_ref().unwrap_or(&no_labels);
    let name = node.metadata.name.clone().unwrap_or_default();
    let spec = node.spec.as_ref();
    let status = node.status.as_ref();
    let node_info = status.and_then(|status| status.node_info.as_ref());

    let role = roles_of(labels);
    let is_no_schedule_taints_empty = no_schedule_taints_empty(spec);
    if role.contains("worker") && !is_no_schedule_taints_empty {
        debug!("worker node [{}] carries a NoSchedule taint", name);
    }

    NodeRecord {
        instance_id: instance_id_of(spec),
        instance_type: label_value(labels, INSTANCE_TYPE_LABEL),
        available_zone: zone_of(&name, labels, context),
        os_type: label_value(labels, OS_LABEL),
        os_id: label_value(labels, OS_ID_LABEL),
        os_image: node_info
            .map(|info| info.os_image.clone())
            .unwrap_or_default(),
        architecture: node_info
            .map(|info| info.architecture.clone())
            .unwrap_or_default(),
        role,
        // Presence of the unschedulable marker counts, not its value.
        scheduleable: spec.map_or(true, |spec| spec.unschedulable.is_none()),
        ready_status: ready_status_of(status),
        allocatable_ephemeral_storage: quantity(status.and_then(|status| {
            status
                .allocatable
                .as_ref()
                .and_then(|allocatable| allocatable.get(EPHEMERAL_STORAGE))
        })),
        ephemeral_storage_capacity: quantity(status.and_then(|status| {
            status
                .capacity
                .as_ref()
                .and_then(|capacity| capacity.get(EPHEMERAL_STORAGE))
        })),
        is_no_schedule_taints_empty,
        name,
    }
}

fn label_value(labels: &BTreeMap<String, String>, key: &str) -> String {
    labels.get(key).cloned().unwrap_or_default()
}

/// Returns the node's availability zone.
///
/// AWS nodes can temporarily miss the standard topology label, so an
/// empty value falls back to the AWS EBS CSI zone label there. No
/// fallback is attempted for other providers.
fn zone_of(name: &str, labels: &BTreeMap<String, String>, context: &SelectionContext) -> String {
    let zone = label_value(labels, ZONE_LABEL);
    if zone.is_empty() && context.cloud_provider == "aws" {
        debug!(
            "node [{}] misses the label [{}], retrying with [{}]",
            name, ZONE_LABEL, AWS_EBS_ZONE_LABEL
        );
        return label_value(labels, AWS_EBS_ZONE_LABEL);
    }
    zone
}

/// Every label key prefixed with `node-role.kubernetes.io/` contributes
/// its suffix as a role member.
fn roles_of(labels: &BTreeMap<String, String>) -> BTreeSet<String> {
    labels
        .keys()
        .filter_map(|key| key.strip_prefix(ROLE_LABEL_PREFIX))
        .map(|role| role.to_owned())
        .collect()
}

fn no_schedule_taints_empty(spec: Option<&NodeSpec>) -> bool {
    !spec
        .and_then(|spec| spec.taints.as_ref())
        .into_iter()
        .flatten()
        .any(|taint| taint.effect == "NoSchedule")
}

fn ready_status_of(status: Option<&NodeStatus>) -> ReadyStatus {
    status
        .and_then(|status| status.conditions.as_ref())
        .into_iter()
        .flatten()
        .find(|condition| condition.type_ == "Ready")
        .map(|condition| ReadyStatus::from_condition(&condition.status))
        .unwrap_or(ReadyStatus::Unknown)
}

/// The instance ID is the last path segment of the provider ID; an
/// absent provider ID yields an empty ID, not an error.
fn instance_id_of(spec: Option<&NodeSpec>) -> String {
    spec.and_then(|spec| spec.provider_id.as_ref())
        .and_then(|provider_id| provider_id.rsplit('/').next())
        .unwrap_or_default()
        .to_owned()
}

fn quantity(quantity: Option<&Quantity>) -> String {
    quantity.map(|quantity| quantity.0.clone()).unwrap_or_default()
}
