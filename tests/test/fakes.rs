//! Fake collaborators for the query and session interfaces

use std::cell::RefCell;

use anyhow::{anyhow, Result};

use storage_node_topology::executor::{RemoteSession, SessionNamespace};
use storage_node_topology::inventory::ClusterQuery;

/// Serves a fixed node-list document.
#[allow(dead_code)]
pub struct StaticClusterQuery {
    json: String,
}

impl StaticClusterQuery {
    #[allow(dead_code)]
    pub fn new(json: String) -> StaticClusterQuery {
        StaticClusterQuery { json }
    }
}

impl ClusterQuery for StaticClusterQuery {
    fn list_nodes_json(&self) -> Result<String> {
        Ok(self.json.clone())
    }
}

/// Fails every node listing.
#[allow(dead_code)]
pub struct FailingClusterQuery;

impl ClusterQuery for FailingClusterQuery {
    fn list_nodes_json(&self) -> Result<String> {
        Err(anyhow!("the cluster API is unreachable"))
    }
}

/// One scripted outcome of a session run
#[derive(Clone)]
#[allow(dead_code)]
pub enum Attempt {
    Ok { stdout: String, stderr: String },
    Err(String),
}

#[allow(dead_code)]
impl Attempt {
    pub fn ok(stdout: &str, stderr: &str) -> Attempt {
        Attempt::Ok {
            stdout: stdout.to_owned(),
            stderr: stderr.to_owned(),
        }
    }

    pub fn err(message: &str) -> Attempt {
        Attempt::Err(message.to_owned())
    }
}

/// Session replaying scripted attempts and recording its invocations
#[allow(dead_code)]
pub struct ScriptedSession {
    attempts: RefCell<Vec<Attempt>>,
    pub calls: RefCell<Vec<(String, SessionNamespace, Vec<String>)>>,
    active_namespaces: Vec<String>,
    namespace_probe_fails: bool,
}

#[allow(dead_code)]
impl ScriptedSession {
    /// Session whose namespace probe reports the given namespaces as
    /// Active.
    pub fn new(attempts: Vec<Attempt>, active_namespaces: &[&str]) -> ScriptedSession {
        ScriptedSession {
            attempts: RefCell::new(attempts),
            calls: RefCell::new(Vec::new()),
            active_namespaces: active_namespaces.iter().map(|ns| (*ns).to_owned()).collect(),
            namespace_probe_fails: false,
        }
    }

    /// Session whose namespace probe itself errors.
    pub fn with_failing_probe(attempts: Vec<Attempt>) -> ScriptedSession {
        ScriptedSession {
            attempts: RefCell::new(attempts),
            calls: RefCell::new(Vec::new()),
            active_namespaces: Vec::new(),
            namespace_probe_fails: true,
        }
    }

    pub fn run_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl RemoteSession for ScriptedSession {
    fn run(
        &self,
        node_name: &str,
        namespace: &SessionNamespace,
        command: &[String],
    ) -> Result<(String, String)> {
        self.calls.borrow_mut().push((
            node_name.to_owned(),
            namespace.clone(),
            command.to_vec(),
        ));
        let mut attempts = self.attempts.borrow_mut();
        if attempts.is_empty() {
            return Err(anyhow!("unable to create the debug pod"));
        }
        match attempts.remove(0) {
            Attempt::Ok { stdout, stderr } => Ok((stdout, stderr)),
            Attempt::Err(message) => Err(anyhow!(message)),
        }
    }

    fn namespace_is_active(&self, namespace: &str) -> Result<bool> {
        if self.namespace_probe_fails {
            return Err(anyhow!("the namespace phase could not be read"));
        }
        Ok(self.active_namespaces.iter().any(|ns| ns == namespace))
    }
}
