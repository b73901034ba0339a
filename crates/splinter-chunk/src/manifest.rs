//! Manifest assembly.
//!
//! Turns ordered fragment metadata into a [`Manifest`] and its owning
//! [`FileRecord`]. Assembly is pure: storage keys are derived, sizes are
//! summed, and the aggregate digest is computed, but nothing is persisted
//! here.

use splinter_types::{
    FileId, FileRecord, FragmentDescriptor, FragmentDigest, FragmentKey, Manifest,
};

use crate::digest;

/// Assemble the manifest and file record for one ingest.
///
/// `fragments` is the ordered `(size, digest)` sequence produced by the
/// chunker and digest engine; position in the slice is the fragment index.
/// The derived storage key for each descriptor is the deterministic
/// function of `(file_id, index)`.
pub fn build_manifest(
    file_id: FileId,
    filename: &str,
    fragments: &[(u32, FragmentDigest)],
) -> (FileRecord, Manifest) {
    build_manifest_with_timestamp(file_id, filename, fragments, now_secs())
}

/// Assemble a manifest with an explicit timestamp (for deterministic
/// testing).
pub fn build_manifest_with_timestamp(
    file_id: FileId,
    filename: &str,
    fragments: &[(u32, FragmentDigest)],
    created_at: u64,
) -> (FileRecord, Manifest) {
    let descriptors: Vec<FragmentDescriptor> = fragments
        .iter()
        .enumerate()
        .map(|(index, &(size, fragment_digest))| FragmentDescriptor {
            file_id,
            index: index as u32,
            size,
            digest: fragment_digest,
            storage_key: FragmentKey::new(file_id, index as u32).storage_key(),
        })
        .collect();

    let record = FileRecord {
        file_id,
        filename: filename.to_string(),
        total_size: fragments.iter().map(|&(size, _)| u64::from(size)).sum(),
        created_at,
        fragment_count: descriptors.len() as u32,
        aggregate: digest::aggregate_digest(fragments.iter().map(|(_, d)| d)),
        algorithm: digest::ALGORITHM,
    };

    let manifest = Manifest {
        file_id,
        fragments: descriptors,
    };

    (record, manifest)
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
