//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "huriwake_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "huriwake_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "huriwake_http_requests_in_flight";

    // Workflow metrics
    pub const SCREENSHOTS_FILED_TOTAL: &str = "huriwake_screenshots_filed_total";
    pub const DETECTED_SUBJECTS: &str = "huriwake_detected_subjects";
    pub const MOVES_TOTAL: &str = "huriwake_review_moves_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "huriwake_rate_limit_hits_total";
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

/// Record a stored screenshot and its detected count.
pub fn record_screenshot_filed(bucket: &str, count: u32) {
    let labels = [("bucket", bucket.to_string())];
    counter!(names::SCREENSHOTS_FILED_TOTAL, &labels).increment(1);
    histogram!(names::DETECTED_SUBJECTS).record(f64::from(count));
}

/// Record a review move by outcome (`moved`, `conflict`, `error`).
pub fn record_move(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::MOVES_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Replace Drive and video ids in a path with placeholders.
///
/// Segments following a collection name that takes an id are replaced, so
/// label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut previous = "";

    for segment in path.split('/') {
        let replaced = match previous {
            "folders" if segment != "cache" => ":folder_id",
            "images" if segment != "move" => ":file_id",
            "videos" if segment != "popular" => ":video_id",
            _ => segment,
        };
        out.push(if segment.is_empty() { segment } else { replaced });
        previous = segment;
    }

    out.join("/")
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
        assert_eq!(
            sanitize_path("/api/folders/1AbC_xyz/images"),
            "/api/folders/:folder_id/images"
        );
        assert_eq!(sanitize_path("/api/images/1AbC"), "/api/images/:file_id");
        assert_eq!(sanitize_path("/api/images/move"), "/api/images/move");
        assert_eq!(sanitize_path("/api/videos/popular"), "/api/videos/popular");
        assert_eq!(sanitize_path("/api/videos/dQw4w9WgXcQ"), "/api/videos/:video_id");
        assert_eq!(
            sanitize_path("/api/folders/cache/refresh"),
            "/api/folders/cache/refresh"
        );
    }
}
