// GET handlers: health, version, sensor registry, range table

use axum::{Json, extract::State, response::IntoResponse};

use super::AppState;
use crate::sensors;
use crate::version::{NAME, VERSION};

/// GET / liveness check.
pub(super) async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "sensor telemetry API is running",
    }))
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /sensors: whitelisted sensors with their fields and default thresholds.
pub(super) async fn sensors_handler() -> impl IntoResponse {
    Json(sensors::list())
}

/// GET /ranges
pub(super) async fn ranges_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.repo.ranges().ranges().to_vec())
}
