//! [`MetaStore`] implementation wrapping fjall partitions.

use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use splinter_types::{FileId, FileRecord, Manifest};
use tracing::debug;

use crate::MetaError;

type Result<T> = std::result::Result<T, MetaError>;

/// Metadata store backed by fjall.
///
/// Holds one record and one manifest per file id. Neither is ever mutated
/// after commit; deletion removes both.
pub struct MetaStore {
    /// The underlying keyspace handle.
    #[allow(dead_code)]
    keyspace: Keyspace,
    /// FileId → serialized FileRecord.
    records: PartitionHandle,
    /// FileId → serialized Manifest.
    manifests: PartitionHandle,
    /// Keeps the temporary directory alive for `open_temporary` stores.
    _temp: Option<tempfile::TempDir>,
}

impl MetaStore {
    /// Open a persistent MetaStore at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let keyspace = Config::new(path).open()?;
        Self::init_partitions(keyspace, None)
    }

    /// Open a temporary MetaStore that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let keyspace = Config::new(tmp.path()).temporary(true).open()?;
        Self::init_partitions(keyspace, Some(tmp))
    }

    fn init_partitions(keyspace: Keyspace, temp: Option<tempfile::TempDir>) -> Result<Self> {
        let records = keyspace.open_partition("records", PartitionCreateOptions::default())?;
        let manifests = keyspace.open_partition("manifests", PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            records,
            manifests,
            _temp: temp,
        })
    }

    // ----- Commit -----

    /// Commit a completed ingest: manifest first, record second.
    ///
    /// The record insert is the single publication point — a reader that
    /// resolves the record is guaranteed to find the manifest.
    pub fn commit(&self, record: &FileRecord, manifest: &Manifest) -> Result<()> {
        self.put_manifest(manifest)?;
        self.put_record(record)?;
        debug!(file_id = %record.file_id, fragments = record.fragment_count, "committed file");
        Ok(())
    }

    // ----- Records -----

    /// Store a file record, keyed by its file id.
    pub fn put_record(&self, record: &FileRecord) -> Result<()> {
        let value = postcard::to_allocvec(record)?;
        self.records
            .insert(record.file_id.as_bytes(), value.as_slice())?;
        Ok(())
    }

    /// Retrieve a file record.
    pub fn get_record(&self, id: FileId) -> Result<Option<FileRecord>> {
        match self.records.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete a file record. Deleting a non-existent id succeeds.
    pub fn delete_record(&self, id: FileId) -> Result<()> {
        self.records.remove(id.as_bytes())?;
        debug!(file_id = %id, "deleted file record");
        Ok(())
    }

    /// List all file records, in key order.
    pub fn list_records(&self) -> Result<Vec<FileRecord>> {
        let mut records = Vec::new();
        for kv in self.records.iter() {
            let (_, value) = kv?;
            records.push(postcard::from_bytes(&value)?);
        }
        Ok(records)
    }

    // ----- Manifests -----

    /// Store a manifest, keyed by its file id.
    pub fn put_manifest(&self, manifest: &Manifest) -> Result<()> {
        let value = postcard::to_allocvec(manifest)?;
        self.manifests
            .insert(manifest.file_id.as_bytes(), value.as_slice())?;
        Ok(())
    }

    /// Retrieve a manifest.
    pub fn get_manifest(&self, id: FileId) -> Result<Option<Manifest>> {
        match self.manifests.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete a manifest. Deleting a non-existent id succeeds.
    pub fn delete_manifest(&self, id: FileId) -> Result<()> {
        self.manifests.remove(id.as_bytes())?;
        debug!(file_id = %id, "deleted manifest");
        Ok(())
    }
}
