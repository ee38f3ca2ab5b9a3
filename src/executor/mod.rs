mod error;
mod process;
mod types;

use std::net::Ipv4Addr;

pub use error::ExecutorError;
pub use process::ShellExecutor;
pub use types::{ProbePolicy, TracePolicy};

/// Reaches into an emulated node to run network diagnostics.
///
/// Implementations block the calling thread for at most the deadline implied
/// by the policy they are given. Output is returned unparsed.
pub trait NodeExecutor: Send + Sync {
    /// Reachable address of a node.
    fn resolve_ip(&self, node: usize) -> Result<Ipv4Addr, ExecutorError>;

    /// Round-trip probe from `node` towards `target`.
    fn probe_rtt(
        &self,
        node: usize,
        target: Ipv4Addr,
        policy: &ProbePolicy,
    ) -> Result<String, ExecutorError>;

    /// Path discovery from `node` towards `target`.
    fn trace_path(
        &self,
        node: usize,
        target: Ipv4Addr,
        policy: &TracePolicy,
    ) -> Result<String, ExecutorError>;
}

#[cfg(test)]
pub mod testing;
