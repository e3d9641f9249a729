//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "narrate_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "narrate_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "narrate_http_requests_in_flight";

    // Compilation metrics
    pub const COMPILATIONS_STARTED_TOTAL: &str = "narrate_compilations_started_total";
    pub const COMPILATIONS_COMPLETED_TOTAL: &str = "narrate_compilations_completed_total";
    pub const COMPILATIONS_FAILED_TOTAL: &str = "narrate_compilations_failed_total";
    pub const COMPILE_DURATION_SECONDS: &str = "narrate_compile_duration_seconds";
    pub const COMPILED_VIDEO_SECONDS: &str = "narrate_compiled_video_seconds";
    pub const COMPILE_SCENE_COUNT: &str = "narrate_compile_scene_count";
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

/// Record a compilation entering the pipeline.
pub fn record_compile_started(scenes: usize, burn_subtitles: bool) {
    let labels = [("subtitles", burn_subtitles.to_string())];
    counter!(names::COMPILATIONS_STARTED_TOTAL, &labels).increment(1);
    histogram!(names::COMPILE_SCENE_COUNT).record(scenes as f64);
}

/// Record a successful compilation.
pub fn record_compile_completed(duration_secs: f64, video_secs: f64) {
    counter!(names::COMPILATIONS_COMPLETED_TOTAL).increment(1);
    histogram!(names::COMPILE_DURATION_SECONDS, "outcome" => "success").record(duration_secs);
    histogram!(names::COMPILED_VIDEO_SECONDS).record(video_secs);
}

/// Record a failed compilation, labelled by the stage it failed in.
pub fn record_compile_failed(stage: &str, code: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string()), ("code", code.to_string())];
    counter!(names::COMPILATIONS_FAILED_TOTAL, &labels).increment(1);
    histogram!(names::COMPILE_DURATION_SECONDS, "outcome" => "failure").record(duration_secs);
}

/// Collapse unknown paths into one label value.
fn sanitize_path(path: &str) -> String {
    match path {
        "/api/video/compile" | "/health" | "/healthz" | "/ready" | "/metrics" => path.to_string(),
        _ => "other".to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

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
        assert_eq!(sanitize_path("/api/video/compile"), "/api/video/compile");
        assert_eq!(sanitize_path("/ready"), "/ready");
        assert_eq!(sanitize_path("/wp-admin/setup.php"), "other");
    }
}
