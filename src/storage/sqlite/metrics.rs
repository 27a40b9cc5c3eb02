//! Metrics recording for `SQLite` operations.

use crate::{Error, Result};
use std::time::Instant;

/// Records operation metrics for storage operations.
///
/// Records two metrics for each operation:
/// 1. `storage_operations_total` - counter by operation and status
/// 2. `storage_operation_duration_ms` - latency histogram
///
/// # Arguments
///
/// * `operation` - Operation name (e.g., `insert_orbit`, `previous_epoch`)
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - Operation status ("success" or "error")
pub fn record_operation_metrics(operation: &'static str, start: Instant, status: &'static str) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => "sqlite",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => "sqlite",
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Runs a database call, records its metrics, and maps any failure to
/// [`Error::OperationFailed`] named after the operation.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if `call` fails.
pub fn instrumented<T>(
    operation: &'static str,
    call: impl FnOnce() -> rusqlite::Result<T>,
) -> Result<T> {
    let start = Instant::now();
    let result = call();
    let status = if result.is_ok() { "success" } else { "error" };
    record_operation_metrics(operation, start, status);
    result.map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })
}
