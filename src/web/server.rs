use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::monitor::{Monitor, MonitorContext, NodePair};

use super::api::doppler as doppler_handlers;
use super::api::monitor as monitor_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Mutex<Monitor>>,
    pub context: Arc<MonitorContext>,
    /// Pairs used when a start request names none.
    pub default_pairs: Arc<Vec<NodePair>>,
}

impl AppState {
    pub fn new(context: Arc<MonitorContext>, default_pairs: Vec<NodePair>) -> Self {
        Self {
            monitor: Arc::new(Mutex::new(Monitor::new(context.clone()))),
            context,
            default_pairs: Arc::new(default_pairs),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Monitor API endpoints
        .route("/api/monitor/start", post(monitor_handlers::start))
        .route("/api/monitor/stop", post(monitor_handlers::stop))
        .route("/api/monitor/status", get(monitor_handlers::status))
        // Doppler API endpoints
        .route("/api/doppler", get(doppler_handlers::estimate))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the control API until Ctrl-C, then stops any running session.
pub async fn run_server(bind_addr: &str, state: AppState) -> std::io::Result<()> {
    let app = router(state.clone());

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Cannot listen for shutdown signal: {}", e);
            }
        })
        .await?;

    let mut monitor = state.monitor.lock().await;
    if monitor.is_running() {
        monitor.stop().await;
    }
    Ok(())
}
