//! Node topology inventory and constraint-based node selection for
//! cluster storage tests
//!
//! The crate builds a normalized snapshot of the cluster nodes from the
//! node-list JSON, classifies the nodes with pure predicates, and picks
//! single nodes or node pairs under topology constraints (same
//! availability zone, different availability zones, schedulable master).
//! A retrying remote-command executor runs shell commands on a chosen
//! node through an ephemeral debug session, and a generic poll guard
//! turns "eventually true" conditions into hard test failures when they
//! time out.

pub mod client;
pub mod executor;
pub mod inventory;
pub mod poll;
pub mod predicates;
pub mod selectors;
pub mod verify;

pub use executor::{RemoteExecError, RemoteExecutor, RemoteSession, SessionNamespace};
pub use inventory::{build_inventory, ClusterQuery, NodeRecord, ReadyStatus, SelectionContext};
pub use poll::{assert_eventually, poll_until, PollTimeout, RetryPolicy};
pub use selectors::{MissingNodeAction, SelectionError};
