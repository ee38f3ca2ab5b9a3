use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A stationary ground station and its flat node index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GroundStationLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub index: usize,
}

impl GroundStationLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64, index: usize) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
            index,
        }
    }

    /// Parses `"lat, lon"` in degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>, index: usize) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=360.0).contains(&lon) {
            return None;
        }
        Some(Self::new(lat, lon, altitude_m.unwrap_or(0.0), index))
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let sin_lon = lon.sin();
        let cos_lon = lon.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        let x = (n + alt_km) * cos_lat * cos_lon;
        let y = (n + alt_km) * cos_lat * sin_lon;
        let z = (n * (1.0 - e2) + alt_km) * sin_lat;
        [x, y, z]
    }

    /// Position in the propagator's inertial frame, with the Earth rotated to `at`.
    pub fn position_inertial_km(&self, at: DateTime<Utc>) -> [f64; 3] {
        let gmst =
            sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&at.naive_utc()));
        ecef_to_inertial(self.position_ecef_km(), gmst)
    }
}

pub fn ecef_to_inertial(pos_ecef: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_ecef[0] * cos_gmst - pos_ecef[1] * sin_gmst,
        pos_ecef[0] * sin_gmst + pos_ecef[1] * cos_gmst,
        pos_ecef[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn parses_coordinates() {
        let gs = GroundStationLocation::from_coordinates("50.110924, 8.682127", None, 101).unwrap();
        assert_eq!(gs.latitude_deg, 50.110924);
        assert_eq!(gs.longitude_deg, 8.682127);
        assert_eq!(gs.altitude_m, 0.0);
        assert_eq!(gs.index, 101);
        assert!(GroundStationLocation::from_coordinates("50.1", None, 1).is_none());
        assert!(GroundStationLocation::from_coordinates("95.0, 1.0", None, 1).is_none());
    }

    #[test]
    fn equator_prime_meridian_is_on_x_axis() {
        let gs = GroundStationLocation::new(0.0, 0.0, 0.0, 1);
        let p = gs.position_ecef_km();
        assert_abs_diff_eq!(p[0], 6378.137, epsilon = 1e-9);
        assert_abs_diff_eq!(p[1], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn inertial_rotation_preserves_length_and_height() {
        let gs = GroundStationLocation::new(46.6357, 14.311817, 450.0, 2);
        let at = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let ecef = gs.position_ecef_km();
        let eci = gs.position_inertial_km(at);
        let norm = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert_abs_diff_eq!(norm(ecef), norm(eci), epsilon = 1e-9);
        assert_abs_diff_eq!(ecef[2], eci[2], epsilon = 1e-12);
    }

    #[test]
    fn quarter_turn_rotation() {
        let p = ecef_to_inertial([1.0, 0.0, 5.0], std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(p[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 5.0, epsilon = 1e-12);
    }
}
