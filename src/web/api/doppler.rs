use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::doppler::format_doppler_shift;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DopplerQuery {
    /// Satellite node index.
    pub sat: usize,
    /// Ground station node index.
    pub gs: usize,
    /// Emulation time in seconds. Defaults to the running session's clock.
    pub at: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DopplerResponse {
    pub satellite: usize,
    pub ground_station: usize,
    pub emulation_time_s: u64,
    pub instant: DateTime<Utc>,
    pub carrier_hz: f64,
    pub shift_hz: f64,
    pub radial_velocity_m_s: f64,
    pub formatted: String,
}

#[utoipa::path(
    get,
    path = "/api/doppler",
    tag = "doppler",
    params(DopplerQuery),
    responses(
        (status = 200, description = "Doppler shift on a ground-satellite link", body = DopplerResponse),
        (status = 404, description = "Unknown satellite or ground station", body = ErrorResponse)
    )
)]
pub async fn estimate(
    State(state): State<AppState>,
    Query(query): Query<DopplerQuery>,
) -> ApiResult<Json<DopplerResponse>> {
    let emulation_time_s = match query.at {
        Some(at) => at,
        None => state.monitor.lock().await.status().emulation_time_s,
    };

    let context = &state.context;
    let sample = context.doppler(query.gs, query.sat, emulation_time_s)?;

    Ok(Json(DopplerResponse {
        satellite: query.sat,
        ground_station: query.gs,
        emulation_time_s,
        instant: context.emulation_instant(emulation_time_s),
        carrier_hz: context.estimator.carrier_hz(),
        shift_hz: sample.shift_hz,
        radial_velocity_m_s: sample.radial_velocity_m_s,
        formatted: format_doppler_shift(sample.shift_hz),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::executor::testing::ScriptedExecutor;
    use crate::monitor::{MemoryLogWriter, MonitorContext};
    use crate::web::api::error::ApiError;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn state() -> AppState {
        let config = Config::from_yaml(
            r#"
constellation:
  orbits: 2
  satellites_per_orbit: 2
  inclination_deg: 53
  altitude_km: 550
ground_stations:
  - coordinates: "50.110924, 8.682127"
radio:
  carrier: 20 GHz
"#,
        )
        .unwrap();
        let context = MonitorContext::from_config(
            &config,
            Arc::new(ScriptedExecutor::default()),
            Arc::new(MemoryLogWriter::default()),
        )
        .unwrap();
        AppState::new(Arc::new(context), config.pairs().unwrap())
    }

    #[tokio::test]
    async fn estimates_at_an_explicit_time() {
        let query = DopplerQuery {
            sat: 2,
            gs: 5,
            at: Some(60),
        };
        let Json(response) = estimate(State(state()), Query(query)).await.unwrap();
        assert_eq!(response.carrier_hz, 20e9);
        assert_eq!(
            response.instant,
            Utc.with_ymd_and_hms(2022, 1, 1, 1, 1, 0).unwrap()
        );
        assert!(response.shift_hz.is_finite());
        assert_eq!(response.formatted, format_doppler_shift(response.shift_hz));
    }

    #[tokio::test]
    async fn idle_monitor_means_time_zero() {
        let query = DopplerQuery {
            sat: 1,
            gs: 5,
            at: None,
        };
        let Json(response) = estimate(State(state()), Query(query)).await.unwrap();
        assert_eq!(response.emulation_time_s, 0);
    }

    #[tokio::test]
    async fn unknown_nodes_are_not_found() {
        let query = DopplerQuery {
            sat: 9,
            gs: 5,
            at: Some(0),
        };
        let result = estimate(State(state()), Query(query)).await;
        assert!(matches!(result, Err(ApiError::NotFound("satellite_not_found"))));

        let query = DopplerQuery {
            sat: 1,
            gs: 6,
            at: Some(0),
        };
        let result = estimate(State(state()), Query(query)).await;
        assert!(matches!(result, Err(ApiError::NotFound("ground_station_not_found"))));
    }
}
