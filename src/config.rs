use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::doppler::GroundStationLocation;
use crate::executor::{ProbePolicy, TracePolicy};
use crate::monitor::NodePair;
use crate::orbit::{Constellation, DragTerms, SatelliteElements};
use crate::topology::Addressing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid carrier frequency: {0}")]
    Carrier(String),
    #[error("invalid station coordinates: {0}")]
    Coordinates(String),
    #[error("invalid pair ({0}, {1}): unknown node index")]
    Pair(usize, usize),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub constellation: ConstellationConfig,
    #[serde(default)]
    pub ground_stations: Vec<StationConfig>,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    pub web: Option<WebConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstellationConfig {
    pub orbits: usize,
    pub satellites_per_orbit: usize,
    pub inclination_deg: f64,
    pub altitude_km: f64,
    #[serde(default = "default_phase_factor")]
    pub phase_factor: usize,
    #[serde(default = "default_eccentricity")]
    pub eccentricity: f64,
    #[serde(default)]
    pub drag: DragTerms,
}

fn default_phase_factor() -> usize {
    18
}

fn default_eccentricity() -> f64 {
    0.001
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub carrier: String,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            carrier: "14 GHz".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(deserialize_with = "human_duration")]
    pub interval: Duration,
    pub pairs: Vec<[usize; 2]>,
    pub log_dir: PathBuf,
    pub probe: ProbePolicy,
    pub trace: TracePolicy,
    #[serde(deserialize_with = "optional_human_duration")]
    pub max_path_age: Option<Duration>,
    #[serde(deserialize_with = "human_duration")]
    pub grace_period: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            pairs: Vec::new(),
            log_dir: PathBuf::from("."),
            probe: ProbePolicy::default(),
            trace: TracePolicy::default(),
            max_path_age: None,
            grace_period: Duration::from_secs(10),
        }
    }
}

/// Alignment constants between the monitor and the external emulation clock.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds added to the wall-clock elapsed time to obtain emulation time.
    pub emulation_offset_s: u64,
    /// Epoch the propagator is seeded with.
    pub orbit_epoch: DateTime<Utc>,
    /// Instant that corresponds to emulation time zero.
    pub emulation_epoch: DateTime<Utc>,
    /// Instant used to rotate ground stations into the inertial frame.
    pub ground_reference: DateTime<Utc>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            emulation_offset_s: 2,
            orbit_epoch: utc(2020, 1, 1, 0),
            emulation_epoch: utc(2022, 1, 1, 1),
            ground_reference: utc(2022, 1, 1, 0),
        }
    }
}

fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Shell templates used to reach into the emulated nodes.
///
/// `{node}` and `{container}` are available in every template; the probe
/// templates additionally get `{ip}` and their policy values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub container: String,
    pub address: String,
    pub ping: String,
    pub traceroute: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            container: "ovs_container_{node}".to_string(),
            address: "docker exec {container} ip -4 -o addr show".to_string(),
            ping: "docker exec {container} ping -c {count} -W {timeout} -i {spacing} {ip}"
                .to_string(),
            traceroute: "docker exec {container} traceroute -n -m {max_hops} -w {wait} {ip}"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.constellation;
        if c.orbits == 0 || c.satellites_per_orbit == 0 {
            return Err(ConfigError::Invalid("constellation must not be empty".into()));
        }
        if c.altitude_km.is_nan() || c.altitude_km <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "altitude must be positive, got {} km",
                c.altitude_km
            )));
        }
        if !(0.0..1.0).contains(&c.eccentricity) {
            return Err(ConfigError::Invalid(format!(
                "eccentricity out of range: {}",
                c.eccentricity
            )));
        }
        if self.monitor.interval.is_zero() {
            return Err(ConfigError::Invalid("monitor interval must be non-zero".into()));
        }
        self.carrier_hz()?;
        self.ground_stations()?;
        self.pairs()?;
        Ok(())
    }

    pub fn constellation_size(&self) -> usize {
        self.constellation.orbits * self.constellation.satellites_per_orbit
    }

    pub fn addressing(&self) -> Addressing {
        Addressing::new(self.constellation_size(), self.ground_stations.len())
    }

    pub fn carrier_hz(&self) -> Result<f64, ConfigError> {
        parse_frequency_hz(&self.radio.carrier)
            .ok_or_else(|| ConfigError::Carrier(self.radio.carrier.clone()))
    }

    pub fn satellites(&self) -> Vec<SatelliteElements> {
        let c = &self.constellation;
        Constellation::walker(
            c.orbits,
            c.satellites_per_orbit,
            c.inclination_deg,
            c.altitude_km,
            c.phase_factor,
        )
        .satellites
        .into_iter()
        .map(|mut s| {
            s.eccentricity = c.eccentricity;
            s.drag = c.drag;
            s
        })
        .collect()
    }

    /// Ground stations with their flat node indices assigned after the satellites.
    pub fn ground_stations(&self) -> Result<Vec<GroundStationLocation>, ConfigError> {
        let base = self.constellation_size();
        self.ground_stations
            .iter()
            .enumerate()
            .map(|(i, s)| {
                GroundStationLocation::from_coordinates(
                    &s.coordinates,
                    Some(s.altitude_m),
                    base + i + 1,
                )
                .ok_or_else(|| ConfigError::Coordinates(s.coordinates.clone()))
            })
            .collect()
    }

    /// Configured pairs, or the default sat-sat / sat-gs / gs-gs trio.
    pub fn pairs(&self) -> Result<Vec<NodePair>, ConfigError> {
        let addressing = self.addressing();
        let raw: Vec<[usize; 2]> = if self.monitor.pairs.is_empty() {
            let n = self.constellation_size();
            vec![[1, 2], [1, n + 1], [n + 1, n + 2]]
                .into_iter()
                .filter(|[a, b]| addressing.node(*a).is_some() && addressing.node(*b).is_some())
                .collect()
        } else {
            self.monitor.pairs.clone()
        };

        raw.into_iter()
            .map(|[a, b]| NodePair::resolve(&addressing, a, b).ok_or(ConfigError::Pair(a, b)))
            .collect()
    }
}

/// Parses strings like `14 GHz`, `435.5MHz`, `2400 kHz` or `14e9`.
pub fn parse_frequency_hz(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    let (number, scale) = [("ghz", 1e9), ("mhz", 1e6), ("khz", 1e3), ("hz", 1.0)]
        .iter()
        .find_map(|(unit, scale)| lower.strip_suffix(unit).map(|n| (n.trim().to_string(), *scale)))
        .unwrap_or((lower.clone(), 1.0));

    let hz = number.parse::<f64>().ok()? * scale;
    (hz.is_finite() && hz > 0.0).then_some(hz)
}

pub(crate) fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

pub(crate) fn optional_human_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
}
