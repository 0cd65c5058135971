use std::time::Duration;

use profilesync_domain::ProfileSyncError;
use tracing::{info, warn};

/// Log the outcome of a user-facing operation with structured fields.
///
/// `operation` should be a stable identifier such as `"profile::save"`.
/// Failures are logged at `warn` with the error kind and whether a later
/// retry may succeed.
#[inline]
pub fn log_operation(operation: &str, elapsed: Duration, error: Option<&ProfileSyncError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(operation, duration_ms, "operation_success"),
        Some(err) => warn!(
            operation,
            duration_ms,
            error_kind = err.label(),
            retryable = err.is_retryable(),
            error = %err,
            "operation_failure"
        ),
    }
}
