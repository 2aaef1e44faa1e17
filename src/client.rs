//! Cluster-backed implementations of the query and session interfaces
//!
//! [`ClusterClient`] wraps a [`Client`][kube::Client] behind a
//! synchronous facade: the selectors, the executor and the verifications
//! are blocking, so the async kube calls run on an owned tokio runtime.
//!
//! The debug session is an ephemeral privileged pod pinned to the target
//! node with the host filesystem mounted at `/host`; commands run through
//! `chroot /host` and the pod is deleted best-effort afterwards.

use anyhow::{anyhow, Context, Result};
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use kube::api::{Api, AttachParams, DeleteParams, ListParams, PostParams, WatchEvent};
use kube::Client;
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::runtime::Runtime;
use tracing::debug;
use uuid::Uuid;

use crate::executor::{RemoteSession, SessionNamespace};
use crate::inventory::ClusterQuery;

const DEBUG_IMAGE: &str = "registry.access.redhat.com/ubi8/ubi:latest";
const POD_START_TIMEOUT_SECS: u32 = 30;

/// Synchronous Kubernetes client serving as [`ClusterQuery`] and
/// [`RemoteSession`]
pub struct ClusterClient {
    runtime: Runtime,
    client: Client,
}

impl ClusterClient {
    /// Creates a [`ClusterClient`] from the default kubeconfig.
    pub fn new() -> Result<ClusterClient> {
        let runtime = Runtime::new().context("Tokio runtime could not be created")?;
        let client = runtime
            .block_on(Client::try_default())
            .context("Kubernetes client could not be created")?;
        Ok(ClusterClient { runtime, client })
    }

    async fn run_debug_pod(
        &self,
        node_name: &str,
        namespace: &SessionNamespace,
        command: &[String],
    ) -> Result<(String, String)> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &namespace.name);
        let pod_name = format!("debug-node-{}", Uuid::new_v4());
        if namespace.cross_namespace {
            debug!(
                "debug pod [{}] runs outside the caller's namespace in [{}]",
                pod_name, namespace.name
            );
        }

        let pod: Pod = serde_json::from_value(debug_pod_spec(&pod_name, node_name))?;
        pods.create(&PostParams::default(), &pod).await?;

        let result = self.exec_in_pod(&pods, &pod_name, command).await;

        // Cleanup is best effort; the command result matters more.
        let _ = pods.delete(&pod_name, &DeleteParams::default()).await;
        result
    }

    async fn exec_in_pod(
        &self,
        pods: &Api<Pod>,
        pod_name: &str,
        command: &[String],
    ) -> Result<(String, String)> {
        self.await_pod_running(pods, pod_name).await?;

        // Node-level commands run against the host filesystem.
        let mut argv = vec![String::from("chroot"), String::from("/host")];
        argv.extend_from_slice(command);

        let attach_params = AttachParams::default()
            .stdin(false)
            .stdout(true)
            .stderr(true);
        let mut attached = pods.exec(pod_name, argv, &attach_params).await?;

        let stdout_stream = attached.stdout();
        let stderr_stream = attached.stderr();
        let status = attached.take_status();

        let (stdout, stderr) =
            tokio::join!(read_to_string(stdout_stream), read_to_string(stderr_stream));
        let status = match status {
            Some(status) => status.await,
            None => None,
        };
        let _ = attached.join().await;

        if let Some(status) = status {
            if status.status.as_deref() == Some("Failure") {
                return Err(anyhow!(
                    "command failed in debug pod [{}]: {}",
                    pod_name,
                    status.message.unwrap_or_default()
                ));
            }
        }

        Ok((stdout, stderr))
    }

    async fn await_pod_running(&self, pods: &Api<Pod>, pod_name: &str) -> Result<()> {
        let is_running = |pod: &Pod| {
            pod.status
                .as_ref()
                .and_then(|status| status.phase.as_ref())
                .map_or(false, |phase| phase == "Running")
        };

        if pods.get(pod_name).await.map_or(false, |pod| is_running(&pod)) {
            return Ok(());
        }

        let list_params = ListParams::default()
            .fields(&format!("metadata.name={}", pod_name))
            .timeout(POD_START_TIMEOUT_SECS);
        let mut stream = pods.watch(&list_params, "0").await?.boxed();

        while let Some(event) = stream.try_next().await? {
            match event {
                WatchEvent::Added(pod) | WatchEvent::Modified(pod) if is_running(&pod) => {
                    return Ok(());
                }
                _ => {}
            }
        }

        Err(anyhow!(
            "unable to create the debug pod [{}] within {} seconds",
            pod_name,
            POD_START_TIMEOUT_SECS
        ))
    }
}

impl ClusterQuery for ClusterClient {
    fn list_nodes_json(&self) -> Result<String> {
        self.runtime.block_on(async {
            let nodes: Api<Node> = Api::all(self.client.clone());
            let node_list = nodes.list(&ListParams::default()).await?;
            Ok(serde_json::to_string(&json!({
                "items": node_list.items
            }))?)
        })
    }
}

impl RemoteSession for ClusterClient {
    fn run(
        &self,
        node_name: &str,
        namespace: &SessionNamespace,
        command: &[String],
    ) -> Result<(String, String)> {
        self.runtime
            .block_on(self.run_debug_pod(node_name, namespace, command))
    }

    fn namespace_is_active(&self, namespace: &str) -> Result<bool> {
        self.runtime.block_on(async {
            let namespaces: Api<Namespace> = Api::all(self.client.clone());
            let ns = namespaces.get(namespace).await?;
            let phase = ns.status.and_then(|status| status.phase);
            Ok(phase.as_deref() == Some("Active"))
        })
    }
}

async fn read_to_string(stream: Option<impl AsyncRead + Unpin>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buffer).await;
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn debug_pod_spec(pod_name: &str, node_name: &str) -> serde_json::Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": pod_name
        },
        "spec": {
            "nodeName": node_name,
            "hostNetwork": true,
            "hostPID": true,
            "restartPolicy": "Never",
            "tolerations": [
                {
                    "operator": "Exists"
                }
            ],
            "containers": [
                {
                    "name": "debug",
                    "image": DEBUG_IMAGE,
                    "command": ["sleep", "3600"],
                    "securityContext": {
                        "privileged": true
                    },
                    "volumeMounts": [
                        {
                            "name": "host",
                            "mountPath": "/host"
                        }
                    ]
                }
            ],
            "volumes": [
                {
                    "name": "host",
                    "hostPath": {
                        "path": "/"
                    }
                }
            ]
        }
    })
}
