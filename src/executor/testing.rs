use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use super::{ExecutorError, NodeExecutor, ProbePolicy, TracePolicy};

/// In-memory executor answering from canned command output.
#[derive(Default)]
pub struct ScriptedExecutor {
    addresses: HashMap<usize, Ipv4Addr>,
    traces: HashMap<(usize, Ipv4Addr), String>,
    pings: HashMap<(usize, Ipv4Addr), String>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedExecutor {
    pub fn with_address(mut self, node: usize, ip: Ipv4Addr) -> Self {
        self.addresses.insert(node, ip);
        self
    }

    pub fn with_trace(mut self, node: usize, target: Ipv4Addr, output: &str) -> Self {
        self.traces.insert((node, target), output.to_string());
        self
    }

    pub fn with_ping(mut self, node: usize, target: Ipv4Addr, output: &str) -> Self {
        self.pings.insert((node, target), output.to_string());
        self
    }

    /// Every call blocks this long before answering, like a slow container.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }
}

fn unscripted(what: String) -> ExecutorError {
    ExecutorError::Io(io::Error::new(io::ErrorKind::NotFound, what))
}

impl NodeExecutor for ScriptedExecutor {
    fn resolve_ip(&self, node: usize) -> Result<Ipv4Addr, ExecutorError> {
        self.record(format!("resolve {node}"));
        self.addresses
            .get(&node)
            .copied()
            .ok_or(ExecutorError::NoAddress(node))
    }

    fn probe_rtt(
        &self,
        node: usize,
        target: Ipv4Addr,
        _policy: &ProbePolicy,
    ) -> Result<String, ExecutorError> {
        self.record(format!("ping {node} {target}"));
        self.pings
            .get(&(node, target))
            .cloned()
            .ok_or_else(|| unscripted(format!("no ping scripted for {node} -> {target}")))
    }

    fn trace_path(
        &self,
        node: usize,
        target: Ipv4Addr,
        _policy: &TracePolicy,
    ) -> Result<String, ExecutorError> {
        self.record(format!("trace {node} {target}"));
        self.traces
            .get(&(node, target))
            .cloned()
            .ok_or_else(|| unscripted(format!("no trace scripted for {node} -> {target}")))
    }
}
