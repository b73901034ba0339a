//! Fragment reconstruction with per-fragment and aggregate verification.

use std::sync::Arc;

use bytes::Bytes;
use splinter_chunk::digest;
use splinter_store::FragmentStore;
use splinter_types::{FileRecord, FragmentKey, Manifest};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::EngineError;

/// Outcome of the fetch scan over one manifest.
enum ScanOutcome {
    /// Every fragment was fetched; payloads in index order.
    Complete(Vec<Bytes>),
    /// One or more fragments are absent. Sorted index list.
    Incomplete(Vec<u32>),
}

/// Rebuilds a file from its manifest.
///
/// Fetches run concurrently (issuing order is irrelevant); assembly is
/// strictly in ascending index order. The reconstructor never retries —
/// transient backend errors are the store decorators' concern, and
/// missing/corrupt fragments are permanent conditions reported to the
/// caller in full.
pub(crate) struct Reconstructor {
    store: Arc<dyn FragmentStore>,
    io_limit: Arc<Semaphore>,
}

impl Reconstructor {
    pub(crate) fn new(store: Arc<dyn FragmentStore>, io_limit: Arc<Semaphore>) -> Self {
        Self { store, io_limit }
    }

    /// Run one reconstruction attempt.
    ///
    /// Returns the exact original bytes, or an error carrying the complete
    /// list of missing and corrupt fragment indices.
    pub(crate) async fn run(
        &self,
        record: &FileRecord,
        manifest: &Manifest,
    ) -> Result<Vec<u8>, EngineError> {
        // Phase 1: fetch everything, recording *all* missing indices
        // rather than aborting on the first.
        let payloads = match self.scan(record, manifest).await? {
            ScanOutcome::Complete(payloads) => payloads,
            ScanOutcome::Incomplete(missing) => {
                warn!(
                    file_id = %record.file_id,
                    missing = missing.len(),
                    "reconstruction: fragments absent"
                );
                return Err(EngineError::Reconstruction {
                    missing,
                    corrupt: Vec::new(),
                });
            }
        };

        // Phase 2: verify every fragment digest against its descriptor.
        let mut corrupt = Vec::new();
        let mut fetched_digests = Vec::with_capacity(payloads.len());
        for (descriptor, payload) in manifest.fragments.iter().zip(&payloads) {
            let computed = digest::fragment_digest(payload);
            if computed != descriptor.digest {
                debug!(
                    index = descriptor.index,
                    expected = %descriptor.digest,
                    actual = %computed,
                    "fragment digest mismatch"
                );
                corrupt.push(descriptor.index);
            }
            fetched_digests.push(computed);
        }
        if !corrupt.is_empty() {
            warn!(
                file_id = %record.file_id,
                corrupt = corrupt.len(),
                "reconstruction: fragments corrupt"
            );
            return Err(EngineError::Reconstruction {
                missing: Vec::new(),
                corrupt,
            });
        }

        // Phase 3: aggregate verification over the fetched digests. This
        // catches manifest tampering and digest-algorithm inconsistencies
        // that per-fragment checks cannot.
        let aggregate = digest::aggregate_digest(fetched_digests.iter());
        if aggregate != record.aggregate {
            error!(
                file_id = %record.file_id,
                expected = %record.aggregate,
                actual = %aggregate,
                "reconstruction: aggregate digest mismatch"
            );
            return Err(EngineError::IntegrityMismatch {
                expected: record.aggregate,
                actual: aggregate,
            });
        }

        // Verified: concatenate in index order.
        let mut out = Vec::with_capacity(record.total_size as usize);
        for payload in &payloads {
            out.extend_from_slice(payload);
        }
        Ok(out)
    }

    /// Fetch all fragments concurrently into index-addressed slots.
    ///
    /// Completion order is irrelevant; the slot vector preserves index
    /// order for assembly. Transient store errors propagate immediately —
    /// they are not evidence of absence.
    async fn scan(
        &self,
        record: &FileRecord,
        manifest: &Manifest,
    ) -> Result<ScanOutcome, EngineError> {
        let mut fetches: Vec<(u32, JoinHandle<Result<Option<Bytes>, splinter_store::StoreError>>)> =
            Vec::with_capacity(manifest.fragments.len());

        for descriptor in &manifest.fragments {
            let key = FragmentKey::new(record.file_id, descriptor.index);
            let store = Arc::clone(&self.store);
            let io_limit = Arc::clone(&self.io_limit);
            fetches.push((
                descriptor.index,
                tokio::spawn(async move {
                    let _permit = io_limit
                        .acquire_owned()
                        .await
                        .map_err(|e| splinter_store::StoreError::Io(std::io::Error::other(e)))?;
                    store.get(&key).await
                }),
            ));
        }

        let mut slots: Vec<Option<Bytes>> = vec![None; manifest.fragments.len()];
        let mut missing = Vec::new();

        for (index, handle) in fetches {
            let fetched = match handle.await {
                Ok(result) => result?,
                Err(join_err) => {
                    return Err(EngineError::Store(splinter_store::StoreError::Io(
                        std::io::Error::other(join_err),
                    )))
                }
            };
            match fetched {
                Some(bytes) => slots[index as usize] = Some(bytes),
                None => missing.push(index),
            }
        }

        if missing.is_empty() {
            Ok(ScanOutcome::Complete(
                slots.into_iter().flatten().collect(),
            ))
        } else {
            missing.sort_unstable();
            Ok(ScanOutcome::Incomplete(missing))
        }
    }
}
