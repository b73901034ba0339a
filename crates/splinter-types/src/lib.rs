//! Shared types and identifiers for Splinter.
//!
//! This crate defines the core data model used across the workspace:
//! identifiers ([`FileId`], [`FragmentKey`]), digests ([`FragmentDigest`],
//! [`AggregateDigest`], [`DigestAlgorithm`]), the persisted metadata
//! ([`FileRecord`], [`FragmentDescriptor`], [`Manifest`]), and the engine
//! configuration ([`EngineConfig`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default fragment size: 1 MiB.
///
/// Smaller fragments mean more objects and more per-fragment overhead;
/// larger fragments mean fewer objects but a bigger blast radius when one
/// is lost or corrupted.
pub const DEFAULT_CHUNK_SIZE: u32 = 1_048_576;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier for one ingested file.
///
/// Freshly generated for every ingest — two uploads of identical content get
/// distinct ids. Displayed as 32 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileId([u8; 16]);

impl FileId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Return the raw 16-byte representation.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl From<[u8; 16]> for FileId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({self})")
    }
}

/// Error parsing a [`FileId`] from its hex representation.
#[derive(Debug, thiserror::Error)]
#[error("invalid file id {0:?}: expected 32 hex characters")]
pub struct ParseFileIdError(String);

impl FromStr for FileId {
    type Err = ParseFileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.as_bytes();
        if raw.len() != 32 {
            return Err(ParseFileIdError(s.to_string()));
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = hex_nibble(raw[i * 2]);
            let lo = hex_nibble(raw[i * 2 + 1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => *byte = (hi << 4) | lo,
                _ => return Err(ParseFileIdError(s.to_string())),
            }
        }
        Ok(Self(bytes))
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Deterministic storage address of one fragment: `(file id, index)`.
///
/// Rendered as `"{file_id}/{index:08}"` — the zero-padded index keeps
/// lexicographic order equal to numeric order, and `"{file_id}/"` is a
/// listable prefix covering every fragment of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FragmentKey {
    /// The owning file.
    pub file_id: FileId,
    /// Fragment ordinal, 0-based.
    pub index: u32,
}

impl FragmentKey {
    /// Create a key for the given file and fragment index.
    pub fn new(file_id: FileId, index: u32) -> Self {
        Self { file_id, index }
    }

    /// Render the opaque storage key handed to the blob backend.
    pub fn storage_key(&self) -> String {
        format!("{}/{:08}", self.file_id, self.index)
    }

    /// The key prefix shared by every fragment of `file_id`.
    pub fn file_prefix(file_id: FileId) -> String {
        format!("{file_id}/")
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:08}", self.file_id, self.index)
    }
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

macro_rules! define_digest {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Hash arbitrary bytes with BLAKE3.
            pub fn from_data(data: &[u8]) -> Self {
                Self(blake3::hash(data).into())
            }

            /// Return the raw 32-byte representation.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl From<blake3::Hash> for $name {
            fn from(hash: blake3::Hash) -> Self {
                Self(hash.into())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

define_digest!(
    /// Content digest of a single fragment: `blake3(fragment_bytes)`.
    FragmentDigest
);

define_digest!(
    /// Whole-file integrity digest: `blake3(digest_0 ++ digest_1 ++ ...)`,
    /// the hash of all fragment digests concatenated in index order.
    ///
    /// Verifying it never requires holding the full file in memory.
    AggregateDigest
);

/// Hash function used for fragment and aggregate digests.
///
/// Recorded on every [`FileRecord`] so the algorithm is recoverable from
/// persisted metadata when a future version adds alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// BLAKE3, 32-byte output.
    Blake3,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted metadata
// ---------------------------------------------------------------------------

/// Metadata for one ingested file. Immutable from creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique identifier, generated at ingest.
    pub file_id: FileId,
    /// Original filename as supplied by the uploader.
    pub filename: String,
    /// Total size of the original file in bytes.
    pub total_size: u64,
    /// Unix timestamp (seconds) when the file was ingested.
    pub created_at: u64,
    /// Number of fragments the file was split into.
    pub fragment_count: u32,
    /// Hash over the ordered concatenation of all fragment digests.
    pub aggregate: AggregateDigest,
    /// Hash function used for `aggregate` and all fragment digests.
    pub algorithm: DigestAlgorithm,
}

/// Metadata for a single fragment within a manifest. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentDescriptor {
    /// Back-reference to the owning file.
    pub file_id: FileId,
    /// Fragment ordinal, 0-based and contiguous within a file.
    pub index: u32,
    /// Fragment length in bytes.
    pub size: u32,
    /// Content digest of the fragment bytes.
    pub digest: FragmentDigest,
    /// Opaque key under which the fragment is stored in the blob backend.
    pub storage_key: String,
}

/// Ordered fragment metadata for one file.
///
/// Insertion order = fragment order = reconstruction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// The file this manifest describes.
    pub file_id: FileId,
    /// Descriptors in ascending index order.
    pub fragments: Vec<FragmentDescriptor>,
}

impl Manifest {
    /// Number of fragments described.
    pub fn fragment_count(&self) -> u32 {
        self.fragments.len() as u32
    }

    /// Check the manifest invariants against its owning record:
    /// contiguous indices from 0, matching back-references, descriptor
    /// count equal to `record.fragment_count`, and fragment sizes summing
    /// to `record.total_size`.
    pub fn validate(&self, record: &FileRecord) -> Result<(), ManifestError> {
        if self.file_id != record.file_id {
            return Err(ManifestError::FileIdMismatch {
                expected: record.file_id,
                found: self.file_id,
            });
        }
        if self.fragment_count() != record.fragment_count {
            return Err(ManifestError::CountMismatch {
                record: record.fragment_count,
                manifest: self.fragment_count(),
            });
        }

        let mut total: u64 = 0;
        for (expected, descriptor) in self.fragments.iter().enumerate() {
            if descriptor.file_id != record.file_id {
                return Err(ManifestError::FileIdMismatch {
                    expected: record.file_id,
                    found: descriptor.file_id,
                });
            }
            if descriptor.index as usize != expected {
                return Err(ManifestError::NonContiguousIndex {
                    expected: expected as u32,
                    found: descriptor.index,
                });
            }
            total += u64::from(descriptor.size);
        }

        if total != record.total_size {
            return Err(ManifestError::SizeMismatch {
                record_total: record.total_size,
                fragment_sum: total,
            });
        }

        Ok(())
    }
}

/// A manifest that violates the structural invariants of the data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// A descriptor (or the manifest itself) references the wrong file.
    #[error("file id mismatch: expected {expected}, found {found}")]
    FileIdMismatch {
        /// The id of the owning record.
        expected: FileId,
        /// The id actually referenced.
        found: FileId,
    },

    /// Fragment indices are not contiguous from 0.
    #[error("non-contiguous fragment index: expected {expected}, found {found}")]
    NonContiguousIndex {
        /// Index implied by position.
        expected: u32,
        /// Index actually recorded.
        found: u32,
    },

    /// Descriptor count disagrees with the record.
    #[error("fragment count mismatch: record says {record}, manifest has {manifest}")]
    CountMismatch {
        /// Count recorded on the file record.
        record: u32,
        /// Descriptors present in the manifest.
        manifest: u32,
    },

    /// Fragment sizes do not sum to the recorded total.
    #[error("size mismatch: record total {record_total}, fragments sum to {fragment_sum}")]
    SizeMismatch {
        /// Total size recorded on the file record.
        record_total: u64,
        /// Sum of all fragment sizes.
        fragment_sum: u64,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the ingest/reconstruction pipeline.
///
/// Retry behaviour is not configured here: transient-error retries belong
/// to the store decorators composed around the backend, not to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fragment size in bytes. Must be positive.
    pub chunk_size: u32,
    /// Maximum concurrent fragment reads/writes per operation.
    pub max_concurrent_io: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_io: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(file_id: FileId, sizes: &[u32]) -> (FileRecord, Manifest) {
        let fragments: Vec<FragmentDescriptor> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| FragmentDescriptor {
                file_id,
                index: i as u32,
                size,
                digest: FragmentDigest::from_data(&[i as u8]),
                storage_key: FragmentKey::new(file_id, i as u32).storage_key(),
            })
            .collect();
        let record = FileRecord {
            file_id,
            filename: "sample.bin".to_string(),
            total_size: sizes.iter().map(|&s| u64::from(s)).sum(),
            created_at: 1_700_000_000,
            fragment_count: sizes.len() as u32,
            aggregate: AggregateDigest::from_data(b"aggregate"),
            algorithm: DigestAlgorithm::Blake3,
        };
        (record, Manifest { file_id, fragments })
    }

    #[test]
    fn test_file_id_generate_unique() {
        let a = FileId::generate();
        let b = FileId::generate();
        assert_ne!(a, b, "fresh ids must not collide");
    }

    #[test]
    fn test_file_id_display_roundtrip() {
        let id = FileId::from([0xAB; 16]);
        let hex = id.to_string();
        assert_eq!(hex.len(), 32);
        assert_eq!(hex.parse::<FileId>().unwrap(), id);
    }

    #[test]
    fn test_file_id_parse_rejects_garbage() {
        assert!("not-a-file-id".parse::<FileId>().is_err());
        assert!("zz".repeat(16).parse::<FileId>().is_err());
        assert!("ab".repeat(15).parse::<FileId>().is_err());
        // 32 bytes of non-ASCII must be rejected, not sliced mid-char.
        assert!("é".repeat(16).parse::<FileId>().is_err());
    }

    #[test]
    fn test_fragment_key_format() {
        let id = FileId::from([0u8; 16]);
        let key = FragmentKey::new(id, 7);
        assert_eq!(key.storage_key(), format!("{id}/00000007"));
        assert!(key.storage_key().starts_with(&FragmentKey::file_prefix(id)));
    }

    #[test]
    fn test_fragment_key_order_matches_index_order() {
        let id = FileId::from([1u8; 16]);
        let low = FragmentKey::new(id, 9).storage_key();
        let high = FragmentKey::new(id, 10).storage_key();
        assert!(low < high, "zero-padding must keep lexicographic order");
    }

    #[test]
    fn test_fragment_digest_deterministic() {
        let d1 = FragmentDigest::from_data(b"fragment bytes");
        let d2 = FragmentDigest::from_data(b"fragment bytes");
        assert_eq!(d1, d2);
        assert_ne!(d1, FragmentDigest::from_data(b"other bytes"));
    }

    #[test]
    fn test_digest_display_is_hex() {
        let digest = FragmentDigest::from([0x0F; 32]);
        assert_eq!(digest.to_string(), "0f".repeat(32));
    }

    #[test]
    fn test_manifest_validate_accepts_well_formed() {
        let (record, manifest) = sample_record(FileId::from([2u8; 16]), &[1024, 1024, 500]);
        manifest.validate(&record).unwrap();
    }

    #[test]
    fn test_manifest_validate_accepts_empty() {
        let (record, manifest) = sample_record(FileId::from([3u8; 16]), &[]);
        assert_eq!(record.fragment_count, 0);
        manifest.validate(&record).unwrap();
    }

    #[test]
    fn test_manifest_validate_rejects_gap() {
        let (record, mut manifest) = sample_record(FileId::from([4u8; 16]), &[10, 10, 10]);
        manifest.fragments[1].index = 5;
        let err = manifest.validate(&record).unwrap_err();
        assert_eq!(
            err,
            ManifestError::NonContiguousIndex {
                expected: 1,
                found: 5
            }
        );
    }

    #[test]
    fn test_manifest_validate_rejects_duplicate_index() {
        let (record, mut manifest) = sample_record(FileId::from([5u8; 16]), &[10, 10]);
        manifest.fragments[1].index = 0;
        assert!(matches!(
            manifest.validate(&record),
            Err(ManifestError::NonContiguousIndex { .. })
        ));
    }

    #[test]
    fn test_manifest_validate_rejects_size_mismatch() {
        let (mut record, manifest) = sample_record(FileId::from([6u8; 16]), &[100, 100]);
        record.total_size = 150;
        assert!(matches!(
            manifest.validate(&record),
            Err(ManifestError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_manifest_validate_rejects_count_mismatch() {
        let (mut record, manifest) = sample_record(FileId::from([7u8; 16]), &[100]);
        record.fragment_count = 2;
        assert!(matches!(
            manifest.validate(&record),
            Err(ManifestError::CountMismatch { .. })
        ));
    }

    #[test]
    fn test_manifest_validate_rejects_foreign_descriptor() {
        let (record, mut manifest) = sample_record(FileId::from([8u8; 16]), &[100]);
        manifest.fragments[0].file_id = FileId::from([9u8; 16]);
        assert!(matches!(
            manifest.validate(&record),
            Err(ManifestError::FileIdMismatch { .. })
        ));
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_concurrent_io, 8);
    }

    // --- Postcard round-trip tests ---

    #[test]
    fn test_file_id_roundtrip_postcard() {
        let id = FileId::generate();
        let encoded = postcard::to_allocvec(&id).unwrap();
        let decoded: FileId = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(id, decoded);
    }

    #[test]
    fn test_record_roundtrip_postcard() {
        let (record, _) = sample_record(FileId::from([10u8; 16]), &[4096, 4096, 1808]);
        let encoded = postcard::to_allocvec(&record).unwrap();
        let decoded: FileRecord = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn test_manifest_roundtrip_postcard() {
        let (_, manifest) = sample_record(FileId::from([11u8; 16]), &[4096, 1808]);
        let encoded = postcard::to_allocvec(&manifest).unwrap();
        let decoded: Manifest = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(manifest, decoded);
    }

    #[test]
    fn test_digest_algorithm_roundtrip_postcard() {
        let encoded = postcard::to_allocvec(&DigestAlgorithm::Blake3).unwrap();
        let decoded: DigestAlgorithm = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(decoded, DigestAlgorithm::Blake3);
    }
}
