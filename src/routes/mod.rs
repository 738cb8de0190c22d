// HTTP routes: sensor queries (latest/history/stats/export) plus service metadata

mod error;
mod http;
mod sensors;

use axum::http::HeaderValue;
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::AppConfig;
use crate::telemetry_repo::TelemetryRepo;

pub use error::ApiError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<TelemetryRepo>,
    pub(crate) config: AppConfig,
}

pub fn app(repo: Arc<TelemetryRepo>, config: AppConfig) -> Router {
    let cors = cors_layer(&config.server.cors_origins);
    let state = AppState { repo, config };
    Router::new()
        .route("/", get(http::root_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/sensors", get(http::sensors_handler)) // GET /sensors
        .route("/ranges", get(http::ranges_handler)) // GET /ranges
        .route("/latest/{sensor}", get(sensors::latest_handler)) // GET /latest/{sensor}
        .route("/history/{sensor}", get(sensors::history_handler)) // GET /history/{sensor}?range=&raw=
        .route("/stats/{sensor}", get(sensors::stats_handler)) // GET /stats/{sensor}?range=
        .route("/export/{sensor}", get(sensors::export_handler)) // GET /export/{sensor}
        .layer(cors)
        .with_state(state)
}

/// Empty origin list = any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any);
    }
    let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(list))
}
