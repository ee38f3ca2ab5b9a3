mod clock;
mod context;
mod error;
mod logbook;
mod monitor;
mod sampler;
mod types;

pub use context::MonitorContext;
pub use error::MonitorError;
pub use logbook::{FileLogWriter, LogWriter};
pub use monitor::{Monitor, MonitorMode, MonitorStatus};
pub use types::NodePair;

#[cfg(test)]
pub use logbook::MemoryLogWriter;
