//! Metadata persistence layer wrapping fjall.
//!
//! [`MetaStore`] provides typed accessors over two fjall partitions:
//!
//! - `records` — [`FileId`](splinter_types::FileId) → serialized
//!   [`FileRecord`](splinter_types::FileRecord). A record present here is
//!   the publication point: readers discover files exclusively through it.
//! - `manifests` — [`FileId`](splinter_types::FileId) → serialized
//!   [`Manifest`](splinter_types::Manifest), persisted *before* the record
//!   so no reader ever resolves a record without its manifest.

mod error;
mod store;

pub use error::MetaError;
pub use store::MetaStore;
