//! A [`FragmentStore`] wrapper that retries transient backend errors.
//!
//! Every operation is attempted up to `attempts` times with exponential
//! backoff between tries. Only [`StoreError`]s are retried — a missing key
//! (`get` returning `Ok(None)`) is a permanent condition and is returned
//! on the first attempt, never masked or re-probed.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use splinter_types::{FileId, FragmentKey};
use tracing::warn;

use crate::error::StoreError;
use crate::traits::FragmentStore;

/// Bounded-attempt retry policy with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per operation (the first try included).
    pub attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given failed attempt (0-based): `base * 2^n`.
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// A [`FragmentStore`] wrapper adding bounded retries at the adapter-call
/// boundary.
///
/// This is the retry point for transient backend failures; permanent
/// conditions (missing fragments, digest mismatches) are handled further up
/// the pipeline and never pass through here as retries.
pub struct RetryStore {
    inner: Arc<dyn FragmentStore>,
    policy: RetryPolicy,
}

impl RetryStore {
    /// Wrap an existing store with the default policy.
    pub fn new(inner: Arc<dyn FragmentStore>) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    /// Wrap an existing store with an explicit policy.
    pub fn with_policy(inner: Arc<dyn FragmentStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.policy.attempts.max(1) {
                        return Err(e);
                    }
                    let delay = self.policy.delay_after(attempt - 1);
                    warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient store error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl FragmentStore for RetryStore {
    async fn put(&self, key: &FragmentKey, data: Bytes) -> Result<(), StoreError> {
        self.run("put", || self.inner.put(key, data.clone())).await
    }

    async fn get(&self, key: &FragmentKey) -> Result<Option<Bytes>, StoreError> {
        self.run("get", || self.inner.get(key)).await
    }

    async fn delete(&self, key: &FragmentKey) -> Result<(), StoreError> {
        self.run("delete", || self.inner.delete(key)).await
    }

    async fn contains(&self, key: &FragmentKey) -> Result<bool, StoreError> {
        self.run("contains", || self.inner.contains(key)).await
    }

    async fn list_file(&self, file_id: FileId) -> Result<Vec<FragmentKey>, StoreError> {
        self.run("list_file", || self.inner.list_file(file_id)).await
    }
}
