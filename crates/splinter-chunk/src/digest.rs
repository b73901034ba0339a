//! Per-fragment and aggregate digest computation.
//!
//! Both digests use BLAKE3. The aggregate digest hashes the ordered
//! concatenation of all fragment digests — never the raw file — so a
//! whole-file integrity check never requires the full file in memory.

use splinter_types::{AggregateDigest, DigestAlgorithm, FragmentDigest};

/// The hash function this build computes. Recorded on every file record.
pub const ALGORITHM: DigestAlgorithm = DigestAlgorithm::Blake3;

/// Content digest of one fragment. Pure.
pub fn fragment_digest(data: &[u8]) -> FragmentDigest {
    FragmentDigest::from_data(data)
}

/// Aggregate digest over fragment digests in index order.
///
/// Hashes incrementally; an empty sequence yields the digest of zero
/// bytes, which is the aggregate of a zero-fragment file.
pub fn aggregate_digest<'a>(
    digests: impl IntoIterator<Item = &'a FragmentDigest>,
) -> AggregateDigest {
    let mut hasher = blake3::Hasher::new();
    for digest in digests {
        hasher.update(digest.as_bytes());
    }
    hasher.finalize().into()
}
