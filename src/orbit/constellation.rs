use chrono::{DateTime, Utc};

use super::{OrbitError, OrbitModel, SatelliteElements};

/// Walker-delta constellation in node index order.
#[derive(Debug, Clone)]
pub struct Constellation {
    pub satellites: Vec<SatelliteElements>,
}

impl Constellation {
    /// Orbit `i` gets RAAN `i / orbits * 360`; slot `j` in it gets mean anomaly
    /// `j * 360 / per_orbit + i * 360 * phase_factor / total` (mod 360).
    pub fn walker(
        orbits: usize,
        per_orbit: usize,
        inclination_deg: f64,
        altitude_km: f64,
        phase_factor: usize,
    ) -> Self {
        let total = orbits * per_orbit;
        let mut satellites = Vec::with_capacity(total);

        for i in 0..orbits {
            let raan = i as f64 / orbits as f64 * 360.0;
            for j in 0..per_orbit {
                let mean_anomaly = (j as f64 * 360.0 / per_orbit as f64
                    + i as f64 * 360.0 * phase_factor as f64 / total as f64)
                    % 360.0;
                satellites.push(SatelliteElements::new(
                    i * per_orbit + j + 1,
                    inclination_deg,
                    altitude_km,
                    mean_anomaly,
                    raan,
                ));
            }
        }

        Self { satellites }
    }

    pub fn propagators(&self, epoch: DateTime<Utc>) -> Result<Vec<OrbitModel>, OrbitError> {
        self.satellites
            .iter()
            .cloned()
            .map(|e| OrbitModel::new(e, epoch))
            .collect()
    }
}
