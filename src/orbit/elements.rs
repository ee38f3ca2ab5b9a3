use serde::{Deserialize, Serialize};

/// Gravitational parameter used to derive mean motion from altitude.
pub const GM_M3_S2: f64 = 3.9860044e14;
/// Mean Earth radius the constellation altitudes are measured from.
pub const EARTH_RADIUS_M: f64 = 6_371_393.0;

const DEFAULT_ECCENTRICITY: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTerms {
    pub bstar: f64,
    pub mean_motion_dot: f64,
    pub mean_motion_ddot: f64,
}

impl Default for DragTerms {
    fn default() -> Self {
        Self {
            bstar: 2.8098e-5,
            mean_motion_dot: 6.969196665e-13,
            mean_motion_ddot: 0.0,
        }
    }
}

/// Keplerian-style template of one satellite. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteElements {
    /// Flat node index, `1..=constellation_size`.
    pub id: usize,
    pub inclination_deg: f64,
    pub altitude_km: f64,
    pub mean_anomaly_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub argument_of_perigee_deg: f64,
    pub drag: DragTerms,
}

impl SatelliteElements {
    pub fn new(
        id: usize,
        inclination_deg: f64,
        altitude_km: f64,
        mean_anomaly_deg: f64,
        raan_deg: f64,
    ) -> Self {
        Self {
            id,
            inclination_deg,
            altitude_km,
            mean_anomaly_deg,
            raan_deg,
            eccentricity: DEFAULT_ECCENTRICITY,
            argument_of_perigee_deg: 0.0,
            drag: DragTerms::default(),
        }
    }

    /// Orbit radius from the Earth's centre, in metres.
    pub fn radius_m(&self) -> f64 {
        EARTH_RADIUS_M + self.altitude_km * 1000.0
    }

    /// Circular-orbit mean motion `sqrt(GM / r^3)`, in radians per minute.
    pub fn mean_motion_rad_min(&self) -> f64 {
        (GM_M3_S2 / self.radius_m().powi(3)).sqrt() * 60.0
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        let angles = [
            self.inclination_deg,
            self.mean_anomaly_deg,
            self.raan_deg,
            self.argument_of_perigee_deg,
        ];
        if angles.iter().any(|a| !a.is_finite()) {
            return Err("non-finite angle".into());
        }
        if !self.altitude_km.is_finite() || self.altitude_km <= 0.0 {
            return Err(format!("altitude must be positive, got {} km", self.altitude_km));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(format!("eccentricity out of range: {}", self.eccentricity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_motion_matches_low_orbit_period() {
        let elements = SatelliteElements::new(1, 53.0, 550.0, 0.0, 0.0);
        let period_min = 2.0 * std::f64::consts::PI / elements.mean_motion_rad_min();
        // ~95.5 minutes at 550 km
        assert!((95.0..96.5).contains(&period_min), "period {period_min}");
    }

    #[test]
    fn rejects_bad_altitude_and_eccentricity() {
        let mut elements = SatelliteElements::new(1, 53.0, -5.0, 0.0, 0.0);
        assert!(elements.check().is_err());
        elements.altitude_km = 550.0;
        assert!(elements.check().is_ok());
        elements.eccentricity = 1.2;
        assert!(elements.check().is_err());
    }
}
