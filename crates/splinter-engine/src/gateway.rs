//! [`FileGateway`] — the boundary exposed to protocol adapters.
//!
//! Adapters (CLI, HTTP, ...) depend on this trait instead of the concrete
//! [`SplinterEngine`](crate::SplinterEngine), making them interchangeable.

use splinter_types::{FileId, FileRecord};

use crate::engine::SplinterEngine;
use crate::error::EngineError;

/// The operations any front-end needs from the fragmentation core.
#[async_trait::async_trait]
pub trait FileGateway: Send + Sync {
    /// Ingest a file; returns its committed record.
    async fn ingest(&self, filename: &str, data: &[u8]) -> Result<FileRecord, EngineError>;

    /// Reconstruct a file's exact original bytes.
    async fn retrieve(&self, file_id: FileId) -> Result<Vec<u8>, EngineError>;

    /// Retrieve a file's record without fetching data.
    async fn head(&self, file_id: FileId) -> Result<FileRecord, EngineError>;

    /// Remove a file and all of its fragments.
    async fn remove(&self, file_id: FileId) -> Result<(), EngineError>;

    /// List the records of all committed files.
    async fn list(&self) -> Result<Vec<FileRecord>, EngineError>;
}

#[async_trait::async_trait]
impl FileGateway for SplinterEngine {
    async fn ingest(&self, filename: &str, data: &[u8]) -> Result<FileRecord, EngineError> {
        SplinterEngine::ingest(self, filename, data).await
    }

    async fn retrieve(&self, file_id: FileId) -> Result<Vec<u8>, EngineError> {
        SplinterEngine::retrieve(self, file_id).await
    }

    async fn head(&self, file_id: FileId) -> Result<FileRecord, EngineError> {
        SplinterEngine::head(self, file_id).await
    }

    async fn remove(&self, file_id: FileId) -> Result<(), EngineError> {
        SplinterEngine::remove(self, file_id).await
    }

    async fn list(&self) -> Result<Vec<FileRecord>, EngineError> {
        SplinterEngine::list(self).await
    }
}
