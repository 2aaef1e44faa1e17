//! Node-list JSON fixtures
//!
//! [`NodeJson`] builds the JSON of a single node the way the API server
//! lists it; [`node_list_json`] assembles the full listing document.

use serde_json::{json, Map, Value};

#[derive(Clone)]
#[allow(dead_code)]
pub struct NodeJson {
    name: String,
    labels: Map<String, Value>,
    taints: Vec<Value>,
    unschedulable: bool,
    ready_status: Option<String>,
    provider_id: Option<String>,
}

#[allow(dead_code)]
impl NodeJson {
    /// A schedulable, Ready Linux worker in no particular zone.
    pub fn worker(name: &str) -> NodeJson {
        let mut node = NodeJson {
            name: name.to_owned(),
            labels: Map::new(),
            taints: Vec::new(),
            unschedulable: false,
            ready_status: Some(String::from("True")),
            provider_id: Some(format!("aws:///us-east-1a/i-{}", name)),
        };
        node.labels.insert(
            String::from("node-role.kubernetes.io/worker"),
            json!(""),
        );
        node.labels
            .insert(String::from("kubernetes.io/os"), json!("linux"));
        node.labels.insert(
            String::from("node.kubernetes.io/instance-type"),
            json!("m6i.xlarge"),
        );
        node
    }

    /// A schedulable, Ready Linux master.
    pub fn master(name: &str) -> NodeJson {
        let mut node = NodeJson::worker(name);
        node.labels.remove("node-role.kubernetes.io/worker");
        node.labels.insert(
            String::from("node-role.kubernetes.io/master"),
            json!(""),
        );
        node
    }

    pub fn zone(mut self, zone: &str) -> NodeJson {
        self.labels
            .insert(String::from("topology.kubernetes.io/zone"), json!(zone));
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> NodeJson {
        self.labels.insert(key.to_owned(), json!(value));
        self
    }

    pub fn without_label(mut self, key: &str) -> NodeJson {
        self.labels.remove(key);
        self
    }

    pub fn role(mut self, role: &str) -> NodeJson {
        self.labels
            .insert(format!("node-role.kubernetes.io/{}", role), json!(""));
        self
    }

    pub fn without_roles(mut self) -> NodeJson {
        self.labels
            .retain(|key, _| !key.starts_with("node-role.kubernetes.io/"));
        self
    }

    pub fn os_id(self, os_id: &str) -> NodeJson {
        self.label("node.openshift.io/os_id", os_id)
    }

    pub fn unschedulable(mut self) -> NodeJson {
        self.unschedulable = true;
        self
    }

    pub fn ready_status(mut self, status: &str) -> NodeJson {
        self.ready_status = Some(status.to_owned());
        self
    }

    pub fn without_ready_condition(mut self) -> NodeJson {
        self.ready_status = None;
        self
    }

    pub fn taint(mut self, effect: &str, key: &str) -> NodeJson {
        self.taints.push(json!({ "effect": effect, "key": key }));
        self
    }

    pub fn provider_id(mut self, provider_id: &str) -> NodeJson {
        self.provider_id = Some(provider_id.to_owned());
        self
    }

    pub fn without_provider_id(mut self) -> NodeJson {
        self.provider_id = None;
        self
    }

    pub fn build(&self) -> Value {
        let mut spec = Map::new();
        if self.unschedulable {
            spec.insert(String::from("unschedulable"), json!(true));
        }
        if !self.taints.is_empty() {
            spec.insert(String::from("taints"), json!(self.taints));
        }
        if let Some(provider_id) = &self.provider_id {
            spec.insert(String::from("providerID"), json!(provider_id));
        }

        let conditions: Vec<Value> = self
            .ready_status
            .iter()
            .map(|status| json!({ "type": "Ready", "status": status }))
            .collect();

        json!({
            "metadata": {
                "name": self.name,
                "labels": self.labels
            },
            "spec": spec,
            "status": {
                "conditions": conditions,
                "nodeInfo": {
                    "architecture": "amd64",
                    "bootID": "",
                    "containerRuntimeVersion": "cri-o://1.24.1",
                    "kernelVersion": "4.18.0",
                    "kubeProxyVersion": "v1.24.0",
                    "kubeletVersion": "v1.24.0",
                    "machineID": "",
                    "operatingSystem": "linux",
                    "osImage": "Red Hat Enterprise Linux CoreOS 412.86",
                    "systemUUID": ""
                },
                "capacity": {
                    "ephemeral-storage": "125293548Ki"
                },
                "allocatable": {
                    "ephemeral-storage": "114396791822"
                }
            }
        })
    }
}

/// Serializes the node fixtures into a node-list document.
#[allow(dead_code)]
pub fn node_list_json(nodes: &[NodeJson]) -> String {
    let items: Vec<Value> = nodes.iter().map(NodeJson::build).collect();
    json!({
        "apiVersion": "v1",
        "kind": "List",
        "items": items
    })
    .to_string()
}
