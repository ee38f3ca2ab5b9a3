pub mod doppler;
pub mod error;
pub mod monitor;
