//! Error types for fragment storage operations.

/// Errors that can occur while talking to the blob backend.
///
/// Every variant is a transient backend condition: callers may retry with
/// bounded attempts (see [`RetryStore`](crate::RetryStore)). A missing key
/// is **not** an error — `get` returns `Ok(None)` and `delete` is
/// idempotent — so absence is never masked behind a retryable failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error from the backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The store has reached its capacity limit.
    #[error("store capacity exceeded: need {needed} bytes, only {available} available")]
    CapacityExceeded {
        /// Bytes needed for the operation.
        needed: u64,
        /// Bytes currently available.
        available: u64,
    },
}
