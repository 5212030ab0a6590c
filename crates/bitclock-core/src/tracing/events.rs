//! Structured log events for key pipeline operations.
//!
//! Each function emits a `tracing` event with structured fields so that
//! the same occurrence is logged identically from every call site.

use crate::errors::ErrorCode;

/// Log a record accepted into a transaction queue.
pub fn event_enqueued(event_type: &str, transaction_id: &str, queue_size: usize) {
    tracing::debug!(
        event = "event_enqueued",
        event_type = %event_type,
        transaction_id = %transaction_id,
        queue_size = queue_size,
        "event enqueued"
    );
}

/// Log a rejected call (invalid input or misuse). The call is a no-op.
pub fn event_rejected<E: ErrorCode + std::fmt::Display>(operation: &str, error: &E) {
    tracing::warn!(
        event = "event_rejected",
        operation = %operation,
        code = error.error_code(),
        error = %error,
        "event rejected"
    );
}

/// Log an API misuse that is ignored (double commit, toc without tic, ...).
pub fn misuse_ignored(operation: &str, reason: &str) {
    tracing::warn!(
        event = "misuse_ignored",
        operation = %operation,
        reason = %reason,
        "ignored"
    );
}

/// Log a batch handed to the transport.
pub fn batch_sent(batch_size: usize, status: u16) {
    tracing::debug!(
        event = "batch_sent",
        batch_size = batch_size,
        status = status,
        "batch delivered"
    );
}

/// Log a batch dropped after a delivery failure.
pub fn batch_dropped<E: ErrorCode + std::fmt::Display>(batch_size: usize, error: &E) {
    tracing::warn!(
        event = "batch_dropped",
        batch_size = batch_size,
        code = error.error_code(),
        error = %error,
        "batch dropped"
    );
}

/// Log a configuration mutation.
pub fn config_changed(field: &str, value: &str) {
    tracing::debug!(
        event = "config_changed",
        field = %field,
        value = %value,
        "config changed"
    );
}
