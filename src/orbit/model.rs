use chrono::{DateTime, Utc};
use serde::Serialize;
use sgp4::{Constants, MinutesSinceEpoch, Orbit};

use super::elements::SatelliteElements;
use super::error::OrbitError;

/// Cartesian state in the propagator's Earth-centred inertial frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitState {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

/// SGP4 propagator seeded from a [`SatelliteElements`] template.
///
/// Elements are fixed at construction; every query is a pure function of the
/// requested instant, so one model may be shared across threads.
pub struct OrbitModel {
    elements: SatelliteElements,
    constants: Constants,
    epoch: DateTime<Utc>,
}

impl OrbitModel {
    pub fn new(elements: SatelliteElements, epoch: DateTime<Utc>) -> Result<Self, OrbitError> {
        elements
            .check()
            .map_err(|reason| OrbitError::InvalidElements {
                id: elements.id,
                reason,
            })?;

        Self::seed(elements, epoch)
    }

    /// Builds the SGP4 constants without re-validating the template.
    fn seed(elements: SatelliteElements, epoch: DateTime<Utc>) -> Result<Self, OrbitError> {
        let orbit_0 = Orbit::from_kozai_elements(
            &sgp4::WGS84,
            elements.inclination_deg.to_radians(),
            elements.raan_deg.to_radians(),
            elements.eccentricity,
            elements.argument_of_perigee_deg.to_radians(),
            elements.mean_anomaly_deg.to_radians(),
            elements.mean_motion_rad_min(),
        )
        .map_err(|e| OrbitError::Propagation(e.to_string()))?;

        let constants = Constants::new(
            sgp4::WGS84,
            sgp4::iau_epoch_to_sidereal_time,
            sgp4::julian_years_since_j2000(&epoch.naive_utc()),
            elements.drag.bstar,
            orbit_0,
        )
        .map_err(|e| OrbitError::Propagation(e.to_string()))?;

        Ok(Self {
            elements,
            constants,
            epoch,
        })
    }

    pub fn elements(&self) -> &SatelliteElements {
        &self.elements
    }

    pub fn state_at(&self, at: DateTime<Utc>) -> Result<OrbitState, OrbitError> {
        let minutes = (at - self.epoch).num_milliseconds() as f64 / 60_000.0;
        let prediction = self.constants.propagate(MinutesSinceEpoch(minutes))?;

        Ok(OrbitState {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        })
    }
}
