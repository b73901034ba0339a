//! File-based fragment storage backend.
//!
//! Stores one file per fragment, grouped into one directory per file id:
//! `{base_dir}/{file_id}/{index:08}`. The directory is the key prefix.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use splinter_types::{FileId, FragmentKey};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::FragmentStore;

/// File-based fragment store with a directory per file id.
///
/// Writes are atomic: data is written to a temporary file first, then
/// renamed into place. A partial write never leaves a half-written
/// fragment visible under its final name.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new file store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Compute the full path for a fragment key.
    fn fragment_path(&self, key: &FragmentKey) -> PathBuf {
        self.base_dir
            .join(key.file_id.to_string())
            .join(format!("{:08}", key.index))
    }

    fn file_dir(&self, file_id: FileId) -> PathBuf {
        self.base_dir.join(file_id.to_string())
    }
}

#[async_trait::async_trait]
impl FragmentStore for FileStore {
    async fn put(&self, key: &FragmentKey, data: Bytes) -> Result<(), StoreError> {
        let path = self.fragment_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Atomic write: temp file in the same directory, then rename.
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!(%key, path = %path.display(), size = data.len(), "stored fragment to file");
        Ok(())
    }

    async fn get(&self, key: &FragmentKey) -> Result<Option<Bytes>, StoreError> {
        let path = self.fragment_path(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn delete(&self, key: &FragmentKey) -> Result<(), StoreError> {
        let path = self.fragment_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%key, "deleted fragment file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn contains(&self, key: &FragmentKey) -> Result<bool, StoreError> {
        let path = self.fragment_path(key);
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list_file(&self, file_id: FileId) -> Result<Vec<FragmentKey>, StoreError> {
        let dir = self.file_dir(file_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                // Skip leftovers from interrupted atomic writes (`*.tmp`).
                if name.len() == 8 {
                    if let Ok(index) = name.parse::<u32>() {
                        keys.push(FragmentKey::new(file_id, index));
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
