use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("invalid elements for satellite {id}: {reason}")]
    InvalidElements { id: usize, reason: String },
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("unknown satellite index {0}")]
    UnknownSatellite(usize),
}

impl From<sgp4::Error> for OrbitError {
    fn from(err: sgp4::Error) -> Self {
        OrbitError::Propagation(err.to_string())
    }
}
