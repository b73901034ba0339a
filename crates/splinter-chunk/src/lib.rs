//! Chunking, digesting, and manifest assembly.
//!
//! This crate provides the pure half of the ingest pipeline:
//! - [`Chunker`] — splits a byte stream into ordered fixed-size fragments.
//! - [`digest`] — per-fragment and aggregate BLAKE3 digests.
//! - [`build_manifest`] — assembles a [`splinter_types::Manifest`] and its
//!   owning [`splinter_types::FileRecord`] from ordered fragment metadata.
//!
//! Nothing here touches storage; persisting fragments and committing
//! manifests is the engine's job.

mod chunker;
pub mod digest;
mod error;
mod manifest;

pub use chunker::{Chunker, Fragment, StreamSplitter};
pub use error::ChunkError;
pub use manifest::{build_manifest, build_manifest_with_timestamp};
