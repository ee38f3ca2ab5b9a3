use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use super::types::{LinkClass, NodePair, Segment, SegmentResult};
use crate::doppler::format_doppler_shift;
use crate::topology::{AccessPath, NodeAddress};

const TITLE: &str = "Real-time Link Monitor Log";
const WALL_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Append-only sink for measurement logs, one target per monitored pair.
pub trait LogWriter: Send + Sync {
    /// Creates (or truncates) a target and writes the session header.
    fn create(&self, target: &str, header: &str) -> io::Result<()>;

    /// Appends `text` followed by a newline.
    fn append(&self, target: &str, text: &str) -> io::Result<()>;
}

/// Writes each target as a text file under one directory.
pub struct FileLogWriter {
    dir: PathBuf,
}

impl FileLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, target: &str) -> PathBuf {
        self.dir.join(target)
    }
}

impl LogWriter for FileLogWriter {
    fn create(&self, target: &str, header: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(target), format!("{header}\n"))
    }

    fn append(&self, target: &str, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.path(target))?;
        writeln!(file, "{text}")
    }
}

fn rtt_text(rtt_ms: Option<f64>) -> String {
    match rtt_ms {
        Some(rtt) => format!("{rtt:.3} ms"),
        None => "FAILED".to_string(),
    }
}

fn stamped(emulation_s: u64, text: String) -> String {
    format!("[T={emulation_s:04}s] {text}")
}

pub fn header_block(started: DateTime<Utc>) -> String {
    format!(
        "{TITLE}\nStarted at: {}\n{}\n",
        started.format(WALL_FORMAT),
        "=".repeat(80)
    )
}

pub fn start_block(at: DateTime<Utc>, interval: Duration, pair_count: usize) -> String {
    format!(
        "\nMonitoring started at {}\nMonitoring interval: {}\nMonitoring {} node pairs\n{}\n",
        at.format(WALL_FORMAT),
        humantime::format_duration(interval),
        pair_count,
        "-".repeat(80)
    )
}

pub fn stop_block(at: DateTime<Utc>) -> String {
    format!(
        "\n\nMonitoring stopped at {}\n{}",
        at.format(WALL_FORMAT),
        "=".repeat(80)
    )
}

/// Single-segment measurement of a satellite-satellite or satellite-ground pair.
pub fn rtt_line(emulation_s: u64, pair: &NodePair, rtt_ms: Option<f64>) -> String {
    stamped(
        emulation_s,
        format!("{}: RTT({}, {}): {}", pair.link_class(), pair.a, pair.b, rtt_text(rtt_ms)),
    )
}

pub fn path_line(emulation_s: u64, src: NodeAddress, dst: NodeAddress, path: &AccessPath) -> String {
    // a path missing either access satellite is reported as a whole
    let route = match (path.source, path.destination) {
        (Some(first), Some(last)) => format!("SAT-{first} --- ISL --- SAT-{last}"),
        _ => "DISCONNECT".to_string(),
    };
    stamped(
        emulation_s,
        format!(
            "Path: {}-{} --- {} --- {}-{}",
            src.category.label(),
            src.index,
            route,
            dst.category.label(),
            dst.index
        ),
    )
}

/// `first` and `second` are printed in the direction of the segment.
pub fn segment_line(
    emulation_s: u64,
    segment: Segment,
    first: NodeAddress,
    second: NodeAddress,
    result: &SegmentResult,
) -> String {
    let mut text = format!("{}: RTT({}, {}): {}", segment, first, second, rtt_text(result.rtt_ms));
    if segment != Segment::InterSatellite {
        let doppler = result
            .doppler_hz
            .map(format_doppler_shift)
            .unwrap_or_else(|| "N/A".to_string());
        text.push_str(&format!(", Doppler Shift: {doppler}"));
    }
    stamped(emulation_s, text)
}

pub fn aggregate_line(
    emulation_s: u64,
    src: NodeAddress,
    dst: NodeAddress,
    total_ms: Option<f64>,
    stale: bool,
) -> String {
    let mut text = format!(
        "{}: RTT({}, {}): {}",
        LinkClass::GroundToGround,
        src,
        dst,
        rtt_text(total_ms)
    );
    if stale {
        text.push_str(" (path stale)");
    }
    stamped(emulation_s, text)
}

#[cfg(test)]
pub use memory::MemoryLogWriter;
