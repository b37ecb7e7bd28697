//! Operation metrics.
//!
//! Recorded through the `metrics` facade. Installing an exporter is left to
//! the host application; without one, recording is a no-op.

use std::time::Instant;

/// Records the count and latency of one operation.
///
/// Emits two metrics, both labelled by `backend`, `operation` and `status`:
/// 1. `adapter_operations_total` - counter
/// 2. `adapter_operation_duration_ms` - histogram
///
/// # Examples
///
/// ```
/// use std::time::Instant;
/// use spanner_bridge::observability::record_operation_metrics;
///
/// let start = Instant::now();
/// record_operation_metrics("sqlite", "execute", start, "success");
/// ```
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "adapter_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "adapter_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to the `status` label.
pub const fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
