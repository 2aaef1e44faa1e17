//! Retrying remote-command execution on a cluster node
//!
//! Commands run in a POSIX shell inside an ephemeral debug session on the
//! target node. Debug-session creation is flaky in CI environments
//! (scheduler races, webhook cold starts), so every execution is wrapped
//! in a short fixed-interval retry that absorbs exactly that failure
//! class; genuine command failures surface to the caller once the retry
//! budget is exhausted.

use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, warn};

use crate::poll::{poll_until, RetryPolicy};

/// Namespace used when the current namespace is not usable
pub const FALLBACK_NAMESPACE: &str = "default";

/// Retry absorbing the transient "unable to create the debug pod" class
pub const DEBUG_SESSION_RETRY: RetryPolicy =
    RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(30));

/// Ephemeral node-scoped command execution (the debug-session
/// abstraction)
pub trait RemoteSession {
    /// Runs the command on the node and returns `(stdout, stderr)`.
    fn run(
        &self,
        node_name: &str,
        namespace: &SessionNamespace,
        command: &[String],
    ) -> Result<(String, String)>;

    /// Whether the namespace is in the `Active` phase.
    fn namespace_is_active(&self, namespace: &str) -> Result<bool>;
}

/// Namespace a debug session executes in
///
/// `cross_namespace` is set when the session runs outside the caller's
/// own namespace and the transport needs an explicit hint for that.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionNamespace {
    pub name: String,
    pub cross_namespace: bool,
}

/// Remote execution failure after the retry budget was exhausted
#[derive(Debug, Error)]
#[error("command [{command}] failed on node [{node}]: {source}")]
pub struct RemoteExecError {
    pub node: String,
    pub command: String,
    /// Combined output captured so far, possibly empty.
    pub output: String,
    #[source]
    pub source: anyhow::Error,
}

/// Runs shell commands on cluster nodes through a [`RemoteSession`]
pub struct RemoteExecutor<'a, S: RemoteSession> {
    session: &'a S,
    namespace: String,
    policy: RetryPolicy,
}

impl<'a, S: RemoteSession> RemoteExecutor<'a, S> {
    /// Creates an executor bound to the caller's current namespace.
    pub fn new(session: &'a S, namespace: &str) -> RemoteExecutor<'a, S> {
        RemoteExecutor::with_policy(session, namespace, DEBUG_SESSION_RETRY)
    }

    pub fn with_policy(
        session: &'a S,
        namespace: &str,
        policy: RetryPolicy,
    ) -> RemoteExecutor<'a, S> {
        RemoteExecutor {
            session,
            namespace: namespace.to_owned(),
            policy,
        }
    }

    /// Executes `command` with `/bin/sh -c` on the node.
    ///
    /// The result is stdout alone when stderr only carries a warning
    /// (e.g. the pod-security advisory of privileged debug sessions),
    /// otherwise stderr and stdout joined by a newline and trimmed.
    pub fn execute(&self, node_name: &str, command: &str) -> Result<String, RemoteExecError> {
        let namespace = self.execution_namespace();
        let argv = vec!["/bin/sh".to_owned(), "-c".to_owned(), command.to_owned()];

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut last_error: Option<anyhow::Error> = None;
        // The poll timeout itself is not an error here; only the last
        // session error counts once the budget is spent.
        let _ = poll_until(self.policy, || {
            match self.session.run(node_name, &namespace, &argv) {
                Ok((out, err)) => {
                    stdout = out;
                    stderr = err;
                    last_error = None;
                    Ok(true)
                }
                Err(error) => {
                    warn!(
                        "command [{}] failed on node [{}], retrying: {:#}",
                        command, node_name, error
                    );
                    last_error = Some(error);
                    Ok(false)
                }
            }
        });

        let output = select_output(&stdout, &stderr);
        match last_error {
            None => {
                debug!(
                    "command [{}] succeeded on node [{}]: [{}]",
                    command, node_name, output
                );
                Ok(output)
            }
            Some(source) => Err(RemoteExecError {
                node: node_name.to_owned(),
                command: command.to_owned(),
                output,
                source,
            }),
        }
    }

    /// Uses the current namespace when it is Active; an inactive
    /// namespace or a failing probe falls back to the well-known default
    /// namespace with the cross-namespace hint set.
    fn execution_namespace(&self) -> SessionNamespace {
        match self.session.namespace_is_active(&self.namespace) {
            Ok(true) => SessionNamespace {
                name: self.namespace.clone(),
                cross_namespace: false,
            },
            _ => SessionNamespace {
                name: FALLBACK_NAMESPACE.to_owned(),
                cross_namespace: true,
            },
        }
    }
}

fn select_output(stdout: &str, stderr: &str) -> String {
    if stderr.to_lowercase().contains("warning") {
        stdout.to_owned()
    } else {
        format!("{}\n{}", stderr, stdout).trim().to_owned()
    }
}
