//! Core trait for fragment storage.

use bytes::Bytes;
use splinter_types::{FileId, FragmentKey};

use crate::error::StoreError;

/// Uniform put/get/delete interface to the opaque blob backend, keyed by
/// `(file id, fragment index)`.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Data is passed as [`Bytes`] to enable zero-copy transfers through the
/// pipeline. The backend is assumed to provide per-key read-your-writes
/// consistency and nothing more — no ordering, locality, or cross-key
/// atomicity.
#[async_trait::async_trait]
pub trait FragmentStore: Send + Sync {
    /// Store a fragment under the given key, replacing any existing value.
    async fn put(&self, key: &FragmentKey, data: Bytes) -> Result<(), StoreError>;

    /// Retrieve a fragment. Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &FragmentKey) -> Result<Option<Bytes>, StoreError>;

    /// Delete a fragment. Deleting a non-existent key succeeds.
    async fn delete(&self, key: &FragmentKey) -> Result<(), StoreError>;

    /// Check whether a fragment exists.
    async fn contains(&self, key: &FragmentKey) -> Result<bool, StoreError>;

    /// List every fragment key stored under the file's prefix, in
    /// ascending index order.
    ///
    /// Used for deletion sweeps and auditing without consulting the
    /// manifest.
    async fn list_file(&self, file_id: FileId) -> Result<Vec<FragmentKey>, StoreError>;
}
