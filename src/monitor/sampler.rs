use log::debug;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::executor::{NodeExecutor, ProbePolicy};

static PING_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time[=<]([\d.]+)\s*ms").expect("valid regex"));

/// RTT of the first answered probe, in milliseconds.
pub fn parse_ping_rtt(output: &str) -> Option<f64> {
    PING_TIME
        .captures(output)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|rtt| rtt.is_finite())
}

/// Measures round-trip time between two emulated nodes.
pub struct SegmentSampler {
    executor: Arc<dyn NodeExecutor>,
    policy: ProbePolicy,
}

impl SegmentSampler {
    pub fn new(executor: Arc<dyn NodeExecutor>, policy: ProbePolicy) -> Self {
        Self { executor, policy }
    }

    pub fn sample_rtt(&self, from: usize, to: usize) -> Option<f64> {
        self.sample_rtt_with(from, to, &self.policy)
    }

    /// Probes `to` from `from`. Any failure, including a missing reply, is `None`.
    pub fn sample_rtt_with(&self, from: usize, to: usize, policy: &ProbePolicy) -> Option<f64> {
        let target = match self.executor.resolve_ip(to) {
            Ok(ip) => ip,
            Err(e) => {
                debug!("Cannot resolve address of node {}: {}", to, e);
                return None;
            }
        };

        match self.executor.probe_rtt(from, target, policy) {
            Ok(output) => {
                let rtt = parse_ping_rtt(&output);
                if rtt.is_none() {
                    debug!("No reply from {} ({}) to node {}", to, target, from);
                }
                rtt
            }
            Err(e) => {
                debug!("Probe {} -> {} failed: {}", from, to, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedExecutor;
    use rstest::rstest;
    use std::net::Ipv4Addr;

    const PING: &str = "\
PING 10.0.3.40 (10.0.3.40) 56(84) bytes of data.
64 bytes from 10.0.3.40: icmp_seq=1 ttl=63 time=12.7 ms
64 bytes from 10.0.3.40: icmp_seq=2 ttl=63 time=11.9 ms

--- 10.0.3.40 ping statistics ---
2 packets transmitted, 2 received, 0% packet loss, time 1001ms
";

    #[rstest]
    #[case(PING, Some(12.7))]
    #[case("64 bytes from 1.2.3.4: icmp_seq=1 ttl=64 time<1 ms", Some(1.0))]
    #[case("64 bytes from 1.2.3.4: icmp_seq=1 ttl=64 time=0.045ms", Some(0.045))]
    #[case("3 packets transmitted, 0 received, 100% packet loss, time 2043ms", None)]
    #[case("", None)]
    fn ping_output(#[case] output: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_ping_rtt(output), expected);
    }

    #[test]
    fn samples_through_the_executor() {
        let sat2 = Ipv4Addr::new(10, 0, 3, 40);
        let executor = Arc::new(
            ScriptedExecutor::default()
                .with_address(2, sat2)
                .with_ping(1, sat2, PING),
        );
        let sampler = SegmentSampler::new(executor.clone(), ProbePolicy::default());
        assert_eq!(sampler.sample_rtt(1, 2), Some(12.7));
        assert_eq!(executor.calls(), vec!["resolve 2", "ping 1 10.0.3.40"]);
    }

    #[test]
    fn unresolvable_target_is_a_failure() {
        let executor = Arc::new(ScriptedExecutor::default());
        let sampler = SegmentSampler::new(executor.clone(), ProbePolicy::default());
        assert_eq!(sampler.sample_rtt(1, 2), None);
        assert_eq!(executor.calls(), vec!["resolve 2"]);
    }

    #[test]
    fn unanswered_probe_is_a_failure() {
        let sat2 = Ipv4Addr::new(10, 0, 3, 40);
        let executor = Arc::new(
            ScriptedExecutor::default()
                .with_address(2, sat2)
                .with_ping(1, sat2, "1 packets transmitted, 0 received, 100% packet loss"),
        );
        let sampler = SegmentSampler::new(executor, ProbePolicy::default());
        assert_eq!(sampler.sample_rtt(1, 2), None);
    }
}
