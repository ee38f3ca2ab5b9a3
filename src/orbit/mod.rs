mod constellation;
mod elements;
mod error;
mod model;

pub use constellation::Constellation;
pub use elements::{DragTerms, SatelliteElements};
pub use error::OrbitError;
pub use model::OrbitModel;
