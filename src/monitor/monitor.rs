use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use super::clock::EmulationClock;
use super::context::MonitorContext;
use super::error::MonitorError;
use super::logbook::{
    aggregate_line, header_block, path_line, rtt_line, segment_line, start_block, stop_block,
};
use super::types::{total_rtt, NodePair, Segment, SegmentResult};
use crate::topology::NodeAddress;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub enum MonitorMode {
    Idle,
    Running {
        session: Uuid,
        started: DateTime<Utc>,
        pairs: Vec<NodePair>,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonitorStatus {
    pub mode: MonitorMode,
    /// Completed measurement passes over all pairs in the current session.
    pub iterations: u64,
    pub emulation_time_s: u64,
    pub log_targets: Vec<String>,
}

#[derive(Debug, Clone)]
struct PairLog {
    pair: NodePair,
    target: String,
}

#[derive(Debug)]
struct Shared {
    status: MonitorStatus,
    clock: EmulationClock,
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<Result<(), MonitorError>>,
    logs: Vec<PairLog>,
}

/// Periodically measures every configured pair on a background task.
///
/// At most one session runs at a time. Starting while running and stopping
/// while idle are both logged no-ops.
pub struct Monitor {
    context: Arc<MonitorContext>,
    shared: Arc<StdMutex<Shared>>,
    worker: Option<WorkerHandle>,
}

impl Monitor {
    pub fn new(context: Arc<MonitorContext>) -> Self {
        let offset = context.timing.emulation_offset_s;
        Self {
            context,
            shared: Arc::new(StdMutex::new(Shared {
                status: MonitorStatus {
                    mode: MonitorMode::Idle,
                    iterations: 0,
                    emulation_time_s: 0,
                    log_targets: Vec::new(),
                },
                clock: EmulationClock::idle(offset),
            })),
            worker: None,
        }
    }

    pub fn status(&self) -> MonitorStatus {
        let locked = self.shared.lock().unwrap();
        let mut status = locked.status.clone();
        status.emulation_time_s = locked.clock.now();
        status
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.join.is_finished())
    }

    pub fn start(&mut self, pairs: Vec<NodePair>) -> Result<(), MonitorError> {
        if self.is_running() {
            warn!("Monitor is already running");
            return Ok(());
        }
        if pairs.is_empty() {
            return Err(MonitorError::NoPairs);
        }
        // a session that ended on its own still holds a finished handle
        self.worker = None;

        let started = Utc::now();
        let stamp = started.format("%Y%m%d_%H%M%S").to_string();
        let logs: Vec<PairLog> = pairs
            .iter()
            .map(|pair| PairLog {
                pair: *pair,
                target: pair.target_name(&stamp),
            })
            .collect();

        let writer = &self.context.logs;
        let header = header_block(started);
        let start = start_block(started, self.context.settings.interval, pairs.len());
        for log in &logs {
            writer
                .create(&log.target, &header)
                .and_then(|_| writer.append(&log.target, &start))
                .map_err(|source| MonitorError::LogTarget {
                    target: log.target.clone(),
                    source,
                })?;
        }

        let session = Uuid::new_v4();
        let clock = EmulationClock::start(self.context.timing.emulation_offset_s);
        {
            let mut locked = self.shared.lock().unwrap();
            locked.clock = clock;
            locked.status = MonitorStatus {
                mode: MonitorMode::Running {
                    session,
                    started,
                    pairs,
                },
                iterations: 0,
                emulation_time_s: 0,
                log_targets: logs.iter().map(|log| log.target.clone()).collect(),
            };
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = {
            let context = self.context.clone();
            let shared = self.shared.clone();
            let logs = logs.clone();
            tokio::spawn(async move {
                let result = run_monitor_loop(context, shared.clone(), logs, clock, stop_rx).await;
                if let Err(e) = &result {
                    error!("Monitor session {} aborted: {}", session, e);
                    shared.lock().unwrap().status.mode = MonitorMode::Idle;
                }
                result
            })
        };

        info!(
            "Monitor session {} started for {} pairs, logging to {:?}",
            session,
            logs.len(),
            logs.iter().map(|log| log.target.as_str()).collect::<Vec<_>>()
        );
        self.worker = Some(WorkerHandle {
            stop_tx,
            join,
            logs,
        });
        Ok(())
    }

    /// Signals the worker and waits up to the grace period before writing the
    /// closing block of every log target.
    ///
    /// A worker still busy after the grace period is aborted, so it starts no
    /// further measurements. The pair it was measuring runs to completion on
    /// the blocking pool, and its lines may land after the closing block.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            warn!("Monitor is not running");
            return;
        };

        // the worker may already have ended on its own
        let _ = worker.stop_tx.send(());
        let grace = self.context.settings.grace_period;
        let mut join = worker.join;
        match tokio::time::timeout(grace, &mut join).await {
            // session errors are reported by the worker itself
            Ok(Ok(_)) => {}
            Ok(Err(e)) => error!("Monitor worker failed: {}", e),
            Err(_) => {
                warn!("Monitor worker did not finish within {:?}, aborting it", grace);
                join.abort();
            }
        }

        let stopped = stop_block(Utc::now());
        for log in &worker.logs {
            if let Err(e) = self.context.logs.append(&log.target, &stopped) {
                warn!("Cannot close log target {}: {}", log.target, e);
            }
        }

        {
            let mut locked = self.shared.lock().unwrap();
            locked.status.mode = MonitorMode::Idle;
            locked.clock = EmulationClock::idle(self.context.timing.emulation_offset_s);
        }
        info!(
            "Monitor stopped, logs saved to {:?}",
            worker.logs.iter().map(|log| log.target.as_str()).collect::<Vec<_>>()
        );
    }
}

async fn run_monitor_loop(
    context: Arc<MonitorContext>,
    shared: Arc<StdMutex<Shared>>,
    logs: Vec<PairLog>,
    clock: EmulationClock,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<(), MonitorError> {
    let interval = context.settings.interval;
    loop {
        for log in &logs {
            if stop_requested(&mut stop_rx) {
                return Ok(());
            }
            // probes block on external processes
            let context = context.clone();
            let log = log.clone();
            tokio::task::spawn_blocking(move || measure_pair(&context, &clock, &log)).await??;
        }
        shared.lock().unwrap().status.iterations += 1;

        let should_stop = tokio::select! {
            _ = tokio::time::sleep(interval) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            return Ok(());
        }
    }
}

/// A dropped sender counts as a stop request.
fn stop_requested(stop_rx: &mut oneshot::Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty))
}

fn append(context: &MonitorContext, log: &PairLog, line: &str) -> Result<(), MonitorError> {
    context
        .logs
        .append(&log.target, line)
        .map_err(|source| MonitorError::LogTarget {
            target: log.target.clone(),
            source,
        })
}

fn measure_pair(
    context: &MonitorContext,
    clock: &EmulationClock,
    log: &PairLog,
) -> Result<(), MonitorError> {
    let pair = &log.pair;
    if pair.is_ground_to_ground() {
        return measure_ground_path(context, clock, log);
    }
    let rtt = context.sampler.sample_rtt(pair.a.index, pair.b.index);
    append(context, log, &rtt_line(clock.now(), pair, rtt))
}

/// Discovers the path between two ground stations, measures its three
/// segments and logs their sum.
fn measure_ground_path(
    context: &MonitorContext,
    clock: &EmulationClock,
    log: &PairLog,
) -> Result<(), MonitorError> {
    let (src, dst) = (log.pair.a, log.pair.b);
    let access = context
        .resolver
        .resolve_access_satellites(src.index, dst.index);
    let discovered = Instant::now();
    append(context, log, &path_line(clock.now(), src, dst, &access))?;

    let uplink = match access.source {
        Some(sat) => {
            let result = measure_ground_link(context, clock, src.index, sat);
            let line = segment_line(
                clock.now(),
                Segment::Uplink,
                src,
                NodeAddress::satellite(sat),
                &result,
            );
            append(context, log, &line)?;
            result
        }
        None => SegmentResult::default(),
    };

    let downlink = match access.destination {
        Some(sat) => {
            let result = measure_ground_link(context, clock, dst.index, sat);
            let line = segment_line(
                clock.now(),
                Segment::Downlink,
                NodeAddress::satellite(sat),
                dst,
                &result,
            );
            append(context, log, &line)?;
            result
        }
        None => SegmentResult::default(),
    };

    let isl = match (access.source, access.destination) {
        (Some(first), Some(last)) => {
            let result = SegmentResult {
                rtt_ms: context.sampler.sample_rtt(first, last),
                doppler_hz: None,
            };
            let line = segment_line(
                clock.now(),
                Segment::InterSatellite,
                NodeAddress::satellite(first),
                NodeAddress::satellite(last),
                &result,
            );
            append(context, log, &line)?;
            result
        }
        _ => SegmentResult::default(),
    };

    let stale = context
        .settings
        .max_path_age
        .is_some_and(|age| discovered.elapsed() > age);
    let total = if stale {
        None
    } else {
        total_rtt(uplink.rtt_ms, downlink.rtt_ms, isl.rtt_ms)
    };
    append(context, log, &aggregate_line(clock.now(), src, dst, total, stale))
}

fn measure_ground_link(
    context: &MonitorContext,
    clock: &EmulationClock,
    gs: usize,
    satellite: usize,
) -> SegmentResult {
    let rtt_ms = context.sampler.sample_rtt(gs, satellite);
    SegmentResult {
        rtt_ms,
        doppler_hz: context.doppler_for_gsl(gs, satellite, clock.now()),
    }
}
