use chrono::{DateTime, Utc};
use log::warn;
use std::sync::Arc;

use super::error::MonitorError;
use super::logbook::LogWriter;
use super::sampler::SegmentSampler;
use crate::config::{Config, MonitorConfig, TimingConfig};
use crate::doppler::{DopplerEstimator, DopplerSample, GroundStationLocation};
use crate::executor::NodeExecutor;
use crate::orbit::{Constellation, OrbitError, OrbitModel};
use crate::topology::{Addressing, PathResolver};

/// Everything a measurement session reads. Built once from the config and
/// shared read-only with the worker.
pub struct MonitorContext {
    pub addressing: Addressing,
    pub satellites: Vec<OrbitModel>,
    pub stations: Vec<GroundStationLocation>,
    pub estimator: DopplerEstimator,
    pub timing: TimingConfig,
    pub settings: MonitorConfig,
    pub resolver: PathResolver,
    pub sampler: SegmentSampler,
    pub logs: Arc<dyn LogWriter>,
}

impl MonitorContext {
    pub fn from_config(
        config: &Config,
        executor: Arc<dyn NodeExecutor>,
        logs: Arc<dyn LogWriter>,
    ) -> Result<Self, MonitorError> {
        let addressing = config.addressing();
        let satellites = Constellation {
            satellites: config.satellites(),
        }
        .propagators(config.timing.orbit_epoch)?;
        let estimator = DopplerEstimator::new(config.carrier_hz()?, config.timing.ground_reference);

        Ok(Self {
            addressing,
            satellites,
            stations: config.ground_stations()?,
            estimator,
            timing: config.timing.clone(),
            settings: config.monitor.clone(),
            resolver: PathResolver::new(executor.clone(), addressing, config.monitor.trace.clone()),
            sampler: SegmentSampler::new(executor, config.monitor.probe.clone()),
            logs,
        })
    }

    pub fn satellite(&self, index: usize) -> Option<&OrbitModel> {
        index.checked_sub(1).and_then(|i| self.satellites.get(i))
    }

    pub fn station(&self, index: usize) -> Option<&GroundStationLocation> {
        self.stations.iter().find(|s| s.index == index)
    }

    /// Absolute instant matching an emulation time.
    pub fn emulation_instant(&self, emulation_s: u64) -> DateTime<Utc> {
        self.timing.emulation_epoch + chrono::Duration::seconds(emulation_s as i64)
    }

    pub fn doppler(
        &self,
        gs: usize,
        satellite: usize,
        emulation_s: u64,
    ) -> Result<DopplerSample, MonitorError> {
        let station = self.station(gs).ok_or(MonitorError::UnknownStation(gs))?;
        let model = self
            .satellite(satellite)
            .ok_or(OrbitError::UnknownSatellite(satellite))?;
        Ok(self
            .estimator
            .estimate(model, station, self.emulation_instant(emulation_s))?)
    }

    /// Doppler shift on the link between `gs` and `satellite`, `None` if it cannot be computed.
    pub fn doppler_for_gsl(&self, gs: usize, satellite: usize, emulation_s: u64) -> Option<f64> {
        match self.doppler(gs, satellite, emulation_s) {
            Ok(sample) => Some(sample.shift_hz),
            Err(e) => {
                warn!("Doppler for gs-{} / sat-{} unavailable: {}", gs, satellite, e);
                None
            }
        }
    }
}
