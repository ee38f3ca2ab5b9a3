use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::GroundStationLocation;
use crate::orbit::{OrbitError, OrbitModel};

pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Below this separation (km) the line of sight is undefined.
const MIN_DISTANCE_KM: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct DopplerSample {
    pub shift_hz: f64,
    /// Positive when the satellite recedes from the station.
    pub radial_velocity_m_s: f64,
}

/// Line-of-sight component of the satellite velocity, in m/s.
pub fn radial_velocity_m_s(sat_pos_km: [f64; 3], sat_vel_km_s: [f64; 3], gs_pos_km: [f64; 3]) -> f64 {
    let dr = [
        sat_pos_km[0] - gs_pos_km[0],
        sat_pos_km[1] - gs_pos_km[1],
        sat_pos_km[2] - gs_pos_km[2],
    ];
    let distance_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
    if distance_km.is_nan() || distance_km < MIN_DISTANCE_KM {
        return 0.0;
    }

    let los_unit = [dr[0] / distance_km, dr[1] / distance_km, dr[2] / distance_km];
    (sat_vel_km_s[0] * los_unit[0] + sat_vel_km_s[1] * los_unit[1] + sat_vel_km_s[2] * los_unit[2])
        * 1000.0
}

/// An approaching transmitter (negative radial velocity) yields a positive shift.
pub fn doppler_shift(
    sat_pos_km: [f64; 3],
    sat_vel_km_s: [f64; 3],
    gs_pos_km: [f64; 3],
    carrier_hz: f64,
) -> DopplerSample {
    let radial_velocity_m_s = radial_velocity_m_s(sat_pos_km, sat_vel_km_s, gs_pos_km);
    let shift_hz = if radial_velocity_m_s == 0.0 {
        0.0
    } else {
        -(radial_velocity_m_s / SPEED_OF_LIGHT_M_S) * carrier_hz
    };
    DopplerSample {
        shift_hz,
        radial_velocity_m_s,
    }
}

/// Doppler shift of ground-satellite links for one carrier frequency.
///
/// Ground stations are always placed in the inertial frame at the same
/// `ground_reference` instant.
#[derive(Debug, Clone, Copy)]
pub struct DopplerEstimator {
    carrier_hz: f64,
    ground_reference: DateTime<Utc>,
}

impl DopplerEstimator {
    pub fn new(carrier_hz: f64, ground_reference: DateTime<Utc>) -> Self {
        Self {
            carrier_hz,
            ground_reference,
        }
    }

    pub fn carrier_hz(&self) -> f64 {
        self.carrier_hz
    }

    pub fn estimate(
        &self,
        satellite: &OrbitModel,
        station: &GroundStationLocation,
        at: DateTime<Utc>,
    ) -> Result<DopplerSample, OrbitError> {
        let state = satellite.state_at(at)?;
        let gs_pos = station.position_inertial_km(self.ground_reference);
        Ok(doppler_shift(
            state.position_km,
            state.velocity_km_s,
            gs_pos,
            self.carrier_hz,
        ))
    }
}
