//! Error types for chunking operations.

/// Errors that can occur while splitting a stream into fragments.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// An I/O error occurred while reading the source stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
