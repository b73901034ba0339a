//! Shared test utilities for splinter-engine tests.

use std::sync::Arc;

use splinter_meta::MetaStore;
use splinter_store::{FragmentStore, MemoryStore, SlowStore};
use splinter_types::EngineConfig;

use crate::engine::SplinterEngine;

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

fn config(chunk_size: u32) -> EngineConfig {
    EngineConfig {
        chunk_size,
        ..EngineConfig::default()
    }
}

/// Engine over an unbounded in-memory store.
///
/// Also returns the concrete store so tests can corrupt or delete
/// fragments behind the manifest's back.
pub fn memory_engine(chunk_size: u32) -> (SplinterEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::unbounded());
    let meta = Arc::new(MetaStore::open_temporary().unwrap());
    let engine = SplinterEngine::new(
        config(chunk_size),
        Arc::clone(&store) as Arc<dyn FragmentStore>,
        meta,
    );
    (engine, store)
}

/// Engine over a byte-capped in-memory store, for provoking write
/// failures mid-ingest.
pub fn capped_engine(chunk_size: u32, max_bytes: u64) -> (SplinterEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(max_bytes));
    let meta = Arc::new(MetaStore::open_temporary().unwrap());
    let engine = SplinterEngine::new(
        config(chunk_size),
        Arc::clone(&store) as Arc<dyn FragmentStore>,
        meta,
    );
    (engine, store)
}

/// Engine whose store injects seeded random IO latency, so fragment
/// fetches and writes complete out of index order.
pub fn slow_engine(chunk_size: u32, seed: u64) -> SplinterEngine {
    let inner = Arc::new(MemoryStore::unbounded());
    let slow = Arc::new(
        SlowStore::new(inner)
            .read_latency(0, 5)
            .write_latency(0, 5)
            .seed(seed),
    );
    let meta = Arc::new(MetaStore::open_temporary().unwrap());
    SplinterEngine::new(config(chunk_size), slow, meta)
}
