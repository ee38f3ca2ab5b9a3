use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::topology::{Addressing, NodeAddress};

/// Two monitored endpoints, in the order they were configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct NodePair {
    pub a: NodeAddress,
    pub b: NodeAddress,
}

impl NodePair {
    /// `None` when either index is outside the node space or both are the same node.
    pub fn resolve(addressing: &Addressing, a: usize, b: usize) -> Option<Self> {
        if a == b {
            return None;
        }
        Some(Self {
            a: addressing.node(a)?,
            b: addressing.node(b)?,
        })
    }

    pub fn link_class(&self) -> LinkClass {
        match (self.a.is_satellite(), self.b.is_satellite()) {
            (true, true) => LinkClass::InterSatellite,
            (false, false) => LinkClass::GroundToGround,
            _ => LinkClass::Mixed,
        }
    }

    pub fn is_ground_to_ground(&self) -> bool {
        self.link_class() == LinkClass::GroundToGround
    }

    /// Log target name for this pair in a session started at `stamp`.
    pub fn target_name(&self, stamp: &str) -> String {
        format!(
            "rt_log_{}_{}-{}_{}-{}.txt",
            stamp, self.a.category, self.a.index, self.b.category, self.b.index
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LinkClass {
    #[strum(serialize = "ISL")]
    InterSatellite,
    #[strum(serialize = "ISL + GSL")]
    Mixed,
    #[strum(serialize = "GS-GS")]
    GroundToGround,
}

/// One leg of a ground-to-ground path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Segment {
    #[strum(serialize = "GS-Sat")]
    Uplink,
    #[strum(serialize = "Sat-GS")]
    Downlink,
    #[strum(serialize = "ISL")]
    InterSatellite,
}

/// Outcome of measuring one segment. `None` marks a failed measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentResult {
    pub rtt_ms: Option<f64>,
    pub doppler_hz: Option<f64>,
}

/// End-to-end RTT, present only when every segment produced a sample.
pub fn total_rtt(uplink: Option<f64>, downlink: Option<f64>, isl: Option<f64>) -> Option<f64> {
    Some(uplink? + downlink? + isl?)
}
