//! Drive and folder-cache metrics.

use metrics::counter;
use metrics::histogram;

/// Metric name constants for consistency.
pub mod names {
    /// Total Drive requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "drive_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "drive_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "drive_latency_seconds";

    /// Folder cache lookups answered from memory.
    pub const FOLDER_CACHE_HITS: &str = "folder_cache_hits_total";

    /// Folder cache lookups that required a listing.
    pub const FOLDER_CACHE_MISSES: &str = "folder_cache_misses_total";

    /// Folders created by the resolver.
    pub const FOLDERS_CREATED: &str = "folders_created_total";
}

/// Record metrics for a completed Drive request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(names::RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}

pub fn record_cache_hit() {
    counter!(names::FOLDER_CACHE_HITS).increment(1);
}

pub fn record_cache_miss() {
    counter!(names::FOLDER_CACHE_MISSES).increment(1);
}

pub fn record_folder_created() {
    counter!(names::FOLDERS_CREATED).increment(1);
}
