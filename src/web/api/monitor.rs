use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::monitor::{MonitorStatus, NodePair};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct PairRequest {
    /// Flat node index of the first endpoint.
    pub a: usize,
    pub b: usize,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartRequest {
    /// Pairs to monitor. Empty means the configured defaults.
    #[serde(default)]
    pub pairs: Vec<PairRequest>,
}

#[utoipa::path(
    post,
    path = "/api/monitor/start",
    request_body = StartRequest,
    responses(
        (status = 200, description = "Monitor running", body = MonitorStatus),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Log targets could not be opened", body = ErrorResponse)
    ),
    tag = "monitor"
)]
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<MonitorStatus>> {
    let pairs = if request.pairs.is_empty() {
        state.default_pairs.as_ref().clone()
    } else {
        let addressing = &state.context.addressing;
        request
            .pairs
            .iter()
            .map(|p| {
                NodePair::resolve(addressing, p.a, p.b).ok_or_else(|| {
                    ApiError::Validation(format!("unknown node pair ({}, {})", p.a, p.b))
                })
            })
            .collect::<ApiResult<Vec<_>>>()?
    };

    let mut monitor = state.monitor.lock().await;
    monitor.start(pairs)?;
    Ok(Json(monitor.status()))
}

#[utoipa::path(
    post,
    path = "/api/monitor/stop",
    responses(
        (status = 200, description = "Monitor stopped", body = MonitorStatus)
    ),
    tag = "monitor"
)]
pub async fn stop(State(state): State<AppState>) -> ApiResult<Json<MonitorStatus>> {
    let mut monitor = state.monitor.lock().await;
    monitor.stop().await;
    Ok(Json(monitor.status()))
}

#[utoipa::path(
    get,
    path = "/api/monitor/status",
    responses(
        (status = 200, description = "Monitor status", body = MonitorStatus)
    ),
    tag = "monitor"
)]
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<MonitorStatus>> {
    let monitor = state.monitor.lock().await;
    Ok(Json(monitor.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::executor::testing::ScriptedExecutor;
    use crate::monitor::{MemoryLogWriter, MonitorContext, MonitorMode};
    use std::sync::Arc;

    const CONFIG: &str = r#"
constellation:
  orbits: 2
  satellites_per_orbit: 2
  inclination_deg: 53
  altitude_km: 550
ground_stations:
  - coordinates: "50.110924, 8.682127"
  - coordinates: "39.931910, 116.403112"
monitor:
  interval: 1h
"#;

    fn state() -> AppState {
        let config = Config::from_yaml(CONFIG).unwrap();
        let context = MonitorContext::from_config(
            &config,
            Arc::new(ScriptedExecutor::default()),
            Arc::new(MemoryLogWriter::default()),
        )
        .unwrap();
        AppState::new(Arc::new(context), config.pairs().unwrap())
    }

    #[tokio::test]
    async fn start_status_stop() {
        let state = state();

        let Json(started) = start(State(state.clone()), Json(StartRequest::default()))
            .await
            .unwrap();
        match started.mode {
            MonitorMode::Running { pairs, .. } => assert_eq!(pairs.len(), 3),
            MonitorMode::Idle => panic!("expected a running session"),
        }
        assert_eq!(started.log_targets.len(), 3);

        let Json(current) = status(State(state.clone())).await.unwrap();
        assert!(matches!(current.mode, MonitorMode::Running { .. }));

        let Json(stopped) = stop(State(state.clone())).await.unwrap();
        assert!(matches!(stopped.mode, MonitorMode::Idle));
    }

    #[tokio::test]
    async fn explicit_pairs_are_validated() {
        let state = state();
        let request = StartRequest {
            pairs: vec![PairRequest { a: 5, b: 42 }],
        };
        let result = start(State(state.clone()), Json(request)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        let Json(current) = status(State(state)).await.unwrap();
        assert!(matches!(current.mode, MonitorMode::Idle));
    }

    #[tokio::test]
    async fn explicit_pairs_replace_the_defaults() {
        let state = state();
        let request = StartRequest {
            pairs: vec![PairRequest { a: 6, b: 5 }],
        };
        let Json(started) = start(State(state.clone()), Json(request)).await.unwrap();
        assert_eq!(started.log_targets.len(), 1);
        assert!(started.log_targets[0].ends_with("_gs-6_gs-5.txt"));
        stop(State(state)).await.unwrap();
    }
}
