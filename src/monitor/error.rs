use thiserror::Error;

use crate::config::ConfigError;
use crate::orbit::OrbitError;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("log target {target}: {source}")]
    LogTarget {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no node pairs to monitor")]
    NoPairs,
    #[error("unknown ground station {0}")]
    UnknownStation(usize),
    #[error("orbit error: {0}")]
    Orbit(#[from] OrbitError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("measurement task failed: {0}")]
    Measurement(#[from] tokio::task::JoinError),
}
