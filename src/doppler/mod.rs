mod estimator;
mod format;
mod ground_station;

pub use estimator::{DopplerEstimator, DopplerSample, SPEED_OF_LIGHT_M_S};
pub use format::format_doppler_shift;
pub use ground_station::GroundStationLocation;
