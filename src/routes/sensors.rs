// Sensor query handlers. Sensor and range are validated by the repo before any SQL runs.

use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Local;
use futures_util::TryStreamExt;
use serde::{Deserialize, Deserializer, de};

use super::{ApiError, AppState};
use crate::telemetry_repo::export::{EXPORT_CONTENT_TYPE, export_filename, export_stream};

#[derive(Debug, Deserialize)]
pub(super) struct HistoryParams {
    range: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    raw: bool,
}

/// Accepts the usual query-string spellings: true/false, 1/0, yes/no, on/off (any case).
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let s = String::deserialize(deserializer)?;
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(de::Error::custom(format!("invalid boolean '{}'", s))),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct StatsParams {
    range: Option<String>,
}

/// GET /latest/{sensor}: newest reading, or a message when the sensor has no data yet.
pub(super) async fn latest_handler(
    Path(sensor): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    match state.repo.latest(&sensor).await? {
        Some(row) => Ok(Json(row).into_response()),
        None => Ok(Json(serde_json::json!({
            "message": format!("no data yet for sensor '{}'", sensor),
        }))
        .into_response()),
    }
}

/// GET /history/{sensor}?range=<key>&raw=<bool>
pub(super) async fn history_handler(
    Path(sensor): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let range = params.range.as_deref().unwrap_or_default();
    let envelope = state.repo.history(&sensor, range, params.raw).await?;
    Ok(Json(envelope).into_response())
}

/// GET /stats/{sensor}?range=<key>
pub(super) async fn stats_handler(
    Path(sensor): Path<String>,
    params: Result<Query<StatsParams>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let range = params.range.as_deref().unwrap_or_default();
    let envelope = state.repo.stats(&sensor, range).await?;
    Ok(Json(envelope).into_response())
}

/// GET /export/{sensor}: streamed CSV attachment, newest first.
/// The pooled connection is held by the body stream and released when it ends or is dropped.
pub(super) async fn export_handler(
    Path(sensor): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let source = state.repo.export_source(&sensor).await?;
    let descriptor = source.sensor();
    let filename = export_filename(descriptor, Local::now());
    tracing::info!(sensor = descriptor.id, %filename, "export started");

    let stream = export_stream(descriptor, source, state.config.export.page_size).inspect_err(
        move |e| tracing::warn!(sensor = descriptor.id, error = %e, "export aborted mid-stream"),
    );

    Ok((
        [
            (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
