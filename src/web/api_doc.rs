use utoipa::OpenApi;

use super::api::doppler::DopplerResponse;
use super::api::error::ErrorResponse;
use super::api::monitor::{PairRequest, StartRequest};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::monitor::start,
        super::api::monitor::stop,
        super::api::monitor::status,
        super::api::doppler::estimate,
    ),
    components(
        schemas(
            StartRequest,
            PairRequest,
            DopplerResponse,
            ErrorResponse,
            crate::monitor::MonitorStatus,
            crate::monitor::MonitorMode,
            crate::monitor::NodePair,
            crate::topology::NodeAddress,
            crate::topology::NodeCategory,
        )
    ),
    info(
        title = "LEO Link Monitor API",
        description = "Control of the real-time link monitor and Doppler queries",
        version = "0.1.0"
    ),
    tags(
        (name = "monitor", description = "Measurement session control"),
        (name = "doppler", description = "Ground-satellite Doppler estimates")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for path in ["/api/monitor/start", "/api/monitor/stop", "/api/monitor/status", "/api/doppler"] {
            assert!(paths.iter().any(|p| p == path), "missing {path}");
        }
    }
}
