//! Health and liveness endpoint handlers

use crate::{
    error::{AppError, Result},
    report::ReportCollector,
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use http::{header, HeaderValue};
use tracing::info;

const HEALTH_CONTENT_TYPE: &str = "application/health+json; charset=UTF-8";

fn health_headers() -> [(header::HeaderName, HeaderValue); 4] {
    [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(HEALTH_CONTENT_TYPE),
        ),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, no-cache, must-revalidate, max-age=3600"),
        ),
        (header::EXPIRES, HeaderValue::from_static("0")),
        (header::VARY, HeaderValue::from_static("Accept-Encoding")),
    ]
}

/// Runs a full evaluation pass and returns the aggregated report.
///
/// The endpoint answers 200 with a well-formed report even when every
/// check failed; only a failure to encode the report yields a 500.
pub async fn handle_health(State(state): State<AppState>) -> Result<impl IntoResponse> {
    info!("GET health - running checks");

    let mut collector = ReportCollector::new(state.report.clone());
    state
        .health_checker
        .run_checks(|component| collector.observe(component))
        .await;
    let report = collector.finish();

    let body = serde_json::to_string(&report).map_err(AppError::from)?;
    Ok((health_headers(), body))
}

/// Fixed healthy payload, encoded once at startup. Distinguishes
/// "process is up" from "dependencies are healthy" and never touches the
/// aggregation engine.
pub async fn handle_liveness(State(state): State<AppState>) -> Response {
    (health_headers(), state.liveness_body.as_ref().clone()).into_response()
}
