//! Error types for the engine.

use splinter_types::{AggregateDigest, FileId, ManifestError};

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Failed to access the metadata store.
    #[error("metadata error: {0}")]
    Meta(#[from] splinter_meta::MetaError),

    /// The fragment store failed after bounded retries.
    #[error("store error: {0}")]
    Store(#[from] splinter_store::StoreError),

    /// Failed to read the ingest source stream.
    #[error("chunk error: {0}")]
    Chunk(#[from] splinter_chunk::ChunkError),

    /// No file with this id exists. Not retryable.
    #[error("file not found: {0}")]
    FileNotFound(FileId),

    /// A fragment write failed during ingest.
    ///
    /// By the time this is returned, every fragment already written for
    /// the file has been rolled back and no record was committed.
    #[error("ingest failed writing fragment {index}: {source}")]
    IngestFailed {
        /// Index of the first fragment whose write failed.
        index: u32,
        /// The underlying store failure.
        source: splinter_store::StoreError,
    },

    /// A stored manifest violates the data-model invariants.
    #[error("invalid manifest: {0}")]
    InvalidManifest(#[from] ManifestError),

    /// One or more fragments are absent or digest-mismatched.
    ///
    /// Carries the complete sorted index lists — never a partial report,
    /// and never downgraded to partial success.
    #[error("reconstruction failed: missing fragments {missing:?}, corrupt fragments {corrupt:?}")]
    Reconstruction {
        /// Indices whose fragments are absent from the store.
        missing: Vec<u32>,
        /// Indices whose fragment bytes do not match their descriptor digest.
        corrupt: Vec<u32>,
    },

    /// All fragments present and individually valid, but the aggregate
    /// digest disagrees with the record. Signals manifest or algorithm
    /// inconsistency; always fatal to the reconstruction attempt.
    #[error("aggregate digest mismatch: expected {expected}, computed {actual}")]
    IntegrityMismatch {
        /// Aggregate digest recorded at ingest.
        expected: AggregateDigest,
        /// Aggregate digest computed from the fetched fragments.
        actual: AggregateDigest,
    },
}
