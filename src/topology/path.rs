use log::debug;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::{Arc, LazyLock};

use super::Addressing;
use crate::executor::{NodeExecutor, TracePolicy};

/// A hop line: the hop number, optionally some lost probes, then the first answering address.
static HOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\d+[ \t]+(?:\*[ \t]+)*(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})")
        .expect("valid regex")
});

/// Hop addresses in order. Hops that answered no probe are skipped.
pub fn parse_traceroute(output: &str) -> Vec<Ipv4Addr> {
    HOP.captures_iter(output)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Satellites on which a ground-to-ground path enters and leaves the constellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPath {
    pub source: Option<usize>,
    pub destination: Option<usize>,
}

pub struct PathResolver {
    executor: Arc<dyn NodeExecutor>,
    addressing: Addressing,
    policy: TracePolicy,
}

impl PathResolver {
    pub fn new(executor: Arc<dyn NodeExecutor>, addressing: Addressing, policy: TracePolicy) -> Self {
        Self {
            executor,
            addressing,
            policy,
        }
    }

    /// Runs path discovery from `src_gs` towards `dst_gs` and picks the access
    /// satellites. Every failure degrades to an empty [`AccessPath`].
    pub fn resolve_access_satellites(&self, src_gs: usize, dst_gs: usize) -> AccessPath {
        let target = match self.executor.resolve_ip(dst_gs) {
            Ok(ip) => ip,
            Err(e) => {
                debug!("Cannot resolve address of node {}: {}", dst_gs, e);
                return AccessPath::default();
            }
        };

        let output = match self.executor.trace_path(src_gs, target, &self.policy) {
            Ok(output) => output,
            Err(e) => {
                debug!("Path discovery {} -> {} failed: {}", src_gs, dst_gs, e);
                return AccessPath::default();
            }
        };

        let hops = parse_traceroute(&output);
        debug!("Path {} -> {}: {:?}", src_gs, dst_gs, hops);
        self.access_satellites(&hops)
    }

    /// First satellite among the leading hops, last satellite among the trailing hops.
    pub fn access_satellites(&self, hops: &[Ipv4Addr]) -> AccessPath {
        if hops.len() < 2 {
            return AccessPath::default();
        }
        let window = self.policy.scan_window.max(1);
        let satellite = |ip: &Ipv4Addr| {
            self.addressing
                .decode(*ip)
                .filter(|node| node.is_satellite())
                .map(|node| node.index)
        };

        AccessPath {
            source: hops.iter().take(window).find_map(satellite),
            destination: hops.iter().rev().take(window).find_map(satellite),
        }
    }
}
