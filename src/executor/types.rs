use serde::Deserialize;
use std::time::Duration;

use crate::config::human_duration;

/// Bounded probe: `attempts` packets, each waited on for `timeout`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProbePolicy {
    pub attempts: u32,
    #[serde(deserialize_with = "human_duration")]
    pub timeout: Duration,
    #[serde(deserialize_with = "human_duration")]
    pub spacing: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(3),
            spacing: Duration::from_millis(200),
        }
    }
}

impl ProbePolicy {
    /// Upper bound on how long one probe may keep the caller blocked.
    pub fn deadline(&self) -> Duration {
        (self.timeout + self.spacing) * self.attempts.max(1) + Duration::from_secs(2)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TracePolicy {
    pub max_hops: u32,
    #[serde(deserialize_with = "human_duration")]
    pub wait: Duration,
    /// Hops inspected at each end of the path when looking for access satellites.
    pub scan_window: usize,
}

impl Default for TracePolicy {
    fn default() -> Self {
        Self {
            max_hops: 10,
            wait: Duration::from_secs(3),
            scan_window: 3,
        }
    }
}

impl TracePolicy {
    pub fn deadline(&self) -> Duration {
        // traceroute sends three queries per hop
        self.wait * 3 * self.max_hops.max(1) + Duration::from_secs(2)
    }
}
