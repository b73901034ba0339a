//! Shared test harness for Splinter integration tests.
//!
//! Provides [`TestVault`] — a file-backed engine rooted in a temporary
//! directory, with direct filesystem access so tests can tamper with
//! stored fragments behind the manifest's back.

use std::path::PathBuf;
use std::sync::Arc;

use splinter_engine::SplinterEngine;
use splinter_meta::MetaStore;
use splinter_store::{FileStore, FragmentStore};
use splinter_types::{EngineConfig, FileId};
use tempfile::TempDir;

/// A [`SplinterEngine`] over a [`FileStore`] and a fjall [`MetaStore`],
/// both living in one temporary directory.
pub struct TestVault {
    pub engine: SplinterEngine,
    chunk_size: u32,
    data_dir: TempDir,
}

impl TestVault {
    /// Create a fresh vault with the given fragment size.
    pub fn new(chunk_size: u32) -> Self {
        let data_dir = TempDir::new().unwrap();
        let engine = open_engine(data_dir.path().to_path_buf(), chunk_size);
        Self {
            engine,
            chunk_size,
            data_dir,
        }
    }

    /// Drop the engine and reopen both stores from the same directory,
    /// simulating a process restart.
    pub fn reopen(self) -> Self {
        let Self {
            engine,
            chunk_size,
            data_dir,
        } = self;
        drop(engine);
        let engine = open_engine(data_dir.path().to_path_buf(), chunk_size);
        Self {
            engine,
            chunk_size,
            data_dir,
        }
    }

    /// On-disk path of one fragment, for direct tampering.
    pub fn fragment_path(&self, file_id: FileId, index: u32) -> PathBuf {
        self.data_dir
            .path()
            .join("fragments")
            .join(file_id.to_string())
            .join(format!("{index:08}"))
    }
}

fn open_engine(data_dir: PathBuf, chunk_size: u32) -> SplinterEngine {
    let store = FileStore::new(data_dir.join("fragments")).unwrap();
    let meta = MetaStore::open(data_dir.join("meta")).unwrap();
    SplinterEngine::new(
        EngineConfig {
            chunk_size,
            ..EngineConfig::default()
        },
        Arc::new(store) as Arc<dyn FragmentStore>,
        Arc::new(meta),
    )
}

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    test_data_seeded(size, 0xDEAD_BEEF)
}

/// Generate deterministic test data from an explicit seed.
pub fn test_data_seeded(size: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = seed;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}
