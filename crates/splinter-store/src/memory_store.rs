//! In-memory fragment storage backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use bytes::Bytes;
use splinter_types::{FileId, FragmentKey};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::FragmentStore;

/// In-memory fragment store backed by a `RwLock<BTreeMap>`.
///
/// Useful for testing and for ephemeral deployments. Tracks total bytes
/// stored against a configurable maximum, so tests can provoke write
/// failures mid-ingest by sizing the cap below the payload.
pub struct MemoryStore {
    fragments: RwLock<BTreeMap<String, Bytes>>,
    max_bytes: u64,
}

impl MemoryStore {
    /// Create a new in-memory store with the given capacity limit.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            fragments: RwLock::new(BTreeMap::new()),
            max_bytes,
        }
    }

    /// Create an in-memory store with no practical capacity limit.
    pub fn unbounded() -> Self {
        Self::new(u64::MAX)
    }

    /// Number of fragments currently stored, across all files.
    pub fn len(&self) -> usize {
        self.fragments.read().expect("lock poisoned").len()
    }

    /// True when the store holds no fragments at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn used_bytes_unlocked(map: &BTreeMap<String, Bytes>) -> u64 {
        map.values().map(|v| v.len() as u64).sum()
    }
}

#[async_trait::async_trait]
impl FragmentStore for MemoryStore {
    async fn put(&self, key: &FragmentKey, data: Bytes) -> Result<(), StoreError> {
        let mut map = self.fragments.write().expect("lock poisoned");
        let used = Self::used_bytes_unlocked(&map);
        let data_len = data.len() as u64;

        // Replacing an existing fragment frees its old bytes.
        let storage_key = key.storage_key();
        let existing_len = map.get(&storage_key).map_or(0, |v| v.len() as u64);
        let net_increase = data_len.saturating_sub(existing_len);

        if used + net_increase > self.max_bytes {
            return Err(StoreError::CapacityExceeded {
                needed: net_increase,
                available: self.max_bytes.saturating_sub(used),
            });
        }

        debug!(%key, size = data.len(), "storing fragment in memory");
        map.insert(storage_key, data);
        Ok(())
    }

    async fn get(&self, key: &FragmentKey) -> Result<Option<Bytes>, StoreError> {
        let map = self.fragments.read().expect("lock poisoned");
        Ok(map.get(&key.storage_key()).cloned())
    }

    async fn delete(&self, key: &FragmentKey) -> Result<(), StoreError> {
        let mut map = self.fragments.write().expect("lock poisoned");
        map.remove(&key.storage_key());
        debug!(%key, "deleted fragment from memory");
        Ok(())
    }

    async fn contains(&self, key: &FragmentKey) -> Result<bool, StoreError> {
        let map = self.fragments.read().expect("lock poisoned");
        Ok(map.contains_key(&key.storage_key()))
    }

    async fn list_file(&self, file_id: FileId) -> Result<Vec<FragmentKey>, StoreError> {
        let prefix = FragmentKey::file_prefix(file_id);
        let map = self.fragments.read().expect("lock poisoned");
        // BTreeMap keeps keys sorted, and the zero-padded index keeps
        // lexicographic order equal to numeric order.
        let keys = map
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| {
                k.strip_prefix(&prefix)
                    .and_then(|idx| idx.parse::<u32>().ok())
                    .map(|idx| FragmentKey::new(file_id, idx))
            })
            .collect();
        Ok(keys)
    }
}
