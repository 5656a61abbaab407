//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use gazewatch_models::AnalysisOutcome;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{ApiError, ApiResult};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> ApiResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "gazewatch_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "gazewatch_http_request_duration_seconds";

    // WebSocket metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "gazewatch_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "gazewatch_ws_connections_active";
    pub const WS_FRAMES_RECEIVED: &str = "gazewatch_ws_frames_received_total";
    pub const WS_SESSIONS_ENDED: &str = "gazewatch_ws_sessions_ended_total";

    // Analysis metrics
    pub const ANALYSIS_OUTCOMES_TOTAL: &str = "gazewatch_analysis_outcomes_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "gazewatch_analysis_duration_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record WebSocket connection.
pub fn record_ws_connection() {
    counter!(names::WS_CONNECTIONS_TOTAL).increment(1);
}

/// Update active WebSocket connections gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record an inbound frame (`text` or `binary`).
pub fn record_frame_received(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::WS_FRAMES_RECEIVED, &labels).increment(1);
}

/// Record how a session ended.
pub fn record_session_ended(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::WS_SESSIONS_ENDED, &labels).increment(1);
}

/// Record one analysis outcome and how long it took.
pub fn record_outcome(outcome: &AnalysisOutcome, duration_secs: f64) {
    let labels = [
        ("status", outcome.status.as_str().to_string()),
        ("emotion", outcome.emotion.as_str().to_string()),
        ("gaze_alert", outcome.gaze_alert.to_string()),
    ];
    counter!(names::ANALYSIS_OUTCOMES_TOTAL, &labels).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS).record(duration_secs);
}

/// Collapse client ids in WebSocket paths so labels stay bounded.
fn sanitize_path(path: &str) -> String {
    match path.strip_prefix("/ws/") {
        Some(rest) if !rest.is_empty() => "/ws/:client_id".to_string(),
        _ => path.to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/ws/student_1"), "/ws/:client_id");
        assert_eq!(sanitize_path("/health"), "/health");
        assert_eq!(sanitize_path("/ws/"), "/ws/");
    }
}
