//! [`SplinterEngine`] — the orchestrator tying chunker, digest engine,
//! fragment store, and metadata store together.

use std::sync::Arc;

use splinter_chunk::{build_manifest, digest, Chunker, StreamSplitter};
use splinter_meta::MetaStore;
use splinter_store::{FragmentStore, StoreError};
use splinter_types::{EngineConfig, FileId, FileRecord, FragmentDigest, FragmentKey};
use tokio::io::AsyncRead;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::reconstruct::Reconstructor;

/// The pipeline orchestrator.
///
/// Owns the fragment store and metadata store (both injected as `Arc`
/// dependencies — no ambient singletons) and provides the full
/// write/read/delete pipeline for files.
pub struct SplinterEngine {
    /// Blob backend for fragment payloads.
    store: Arc<dyn FragmentStore>,
    /// Persisted records and manifests.
    meta: Arc<MetaStore>,
    /// Default chunker, built from `config.chunk_size`.
    chunker: Chunker,
    /// Bounds concurrent fragment reads/writes per operation.
    io_limit: Arc<Semaphore>,
}

impl SplinterEngine {
    /// Create a new engine with the given configuration and components.
    pub fn new(config: EngineConfig, store: Arc<dyn FragmentStore>, meta: Arc<MetaStore>) -> Self {
        Self {
            store,
            meta,
            chunker: Chunker::new(config.chunk_size),
            io_limit: Arc::new(Semaphore::new(config.max_concurrent_io.max(1))),
        }
    }

    /// Return a reference to the fragment store.
    pub fn store(&self) -> &Arc<dyn FragmentStore> {
        &self.store
    }

    /// Return a reference to the metadata store.
    pub fn meta(&self) -> &Arc<MetaStore> {
        &self.meta
    }

    /// The configured default fragment size.
    pub fn chunk_size(&self) -> u32 {
        self.chunker.chunk_size()
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Ingest a file with the engine's configured chunk size.
    ///
    /// Returns the committed [`FileRecord`]. The file id is freshly
    /// generated and never visible to readers until every fragment is
    /// durably stored and the manifest is committed.
    pub async fn ingest(&self, filename: &str, data: &[u8]) -> Result<FileRecord, EngineError> {
        self.ingest_with_chunk_size(filename, data, self.chunker.chunk_size())
            .await
    }

    /// Ingest a file with an explicit chunk size.
    pub async fn ingest_with_chunk_size(
        &self,
        filename: &str,
        data: &[u8],
        chunk_size: u32,
    ) -> Result<FileRecord, EngineError> {
        let file_id = FileId::generate();
        let chunker = Chunker::new(chunk_size);

        info!(%file_id, filename, total_size = data.len(), chunk_size, "ingest: starting");

        let mut parts: Vec<(u32, FragmentDigest)> = Vec::new();
        let mut writes: Vec<(u32, JoinHandle<Result<(), StoreError>>)> = Vec::new();

        for fragment in chunker.split(data) {
            let fragment_digest = digest::fragment_digest(&fragment.data);
            parts.push((fragment.size(), fragment_digest));
            writes.push((fragment.index, self.spawn_write(file_id, fragment.index, fragment.data)));
        }

        self.finish_ingest(file_id, filename, parts, writes).await
    }

    /// Ingest from an async reader, pulling one fragment at a time.
    ///
    /// The source is consumed; fragment writes overlap with reading, but
    /// the manifest is still committed only after every write lands.
    pub async fn ingest_reader<R>(
        &self,
        filename: &str,
        reader: R,
        chunk_size: u32,
    ) -> Result<FileRecord, EngineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let file_id = FileId::generate();
        info!(%file_id, filename, chunk_size, "ingest: starting from stream");

        let mut splitter = StreamSplitter::new(reader, chunk_size);
        let mut parts: Vec<(u32, FragmentDigest)> = Vec::new();
        let mut writes: Vec<(u32, JoinHandle<Result<(), StoreError>>)> = Vec::new();

        loop {
            let fragment = match splitter.next_fragment().await {
                Ok(Some(fragment)) => fragment,
                Ok(None) => break,
                Err(e) => {
                    // The source died mid-stream: let every in-flight
                    // write settle, then discard them all. Nothing was
                    // published.
                    let written = writes.len() as u32;
                    for (_, handle) in writes {
                        let _ = handle.await;
                    }
                    self.rollback(file_id, written).await;
                    return Err(e.into());
                }
            };
            let fragment_digest = digest::fragment_digest(&fragment.data);
            parts.push((fragment.size(), fragment_digest));
            writes.push((fragment.index, self.spawn_write(file_id, fragment.index, fragment.data)));
        }

        self.finish_ingest(file_id, filename, parts, writes).await
    }

    /// Spawn one bounded, concurrent fragment write.
    fn spawn_write(
        &self,
        file_id: FileId,
        index: u32,
        data: bytes::Bytes,
    ) -> JoinHandle<Result<(), StoreError>> {
        let key = FragmentKey::new(file_id, index);
        let store = Arc::clone(&self.store);
        let io_limit = Arc::clone(&self.io_limit);
        tokio::spawn(async move {
            let _permit = io_limit
                .acquire_owned()
                .await
                .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
            debug!(%key, size = data.len(), "writing fragment");
            store.put(&key, data).await
        })
    }

    /// Gather all fragment writes, then commit manifest and record —
    /// the all-or-nothing visibility barrier. Any write failure rolls
    /// back every fragment written for this file id.
    async fn finish_ingest(
        &self,
        file_id: FileId,
        filename: &str,
        parts: Vec<(u32, FragmentDigest)>,
        writes: Vec<(u32, JoinHandle<Result<(), StoreError>>)>,
    ) -> Result<FileRecord, EngineError> {
        let fragment_total = writes.len() as u32;
        let mut failed: Option<(u32, StoreError)> = None;

        for (index, handle) in writes {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(StoreError::Io(std::io::Error::other(join_err))),
            };
            if let Err(e) = result {
                // Keep gathering so every in-flight write settles before
                // the rollback deletes run.
                if failed.is_none() {
                    failed = Some((index, e));
                }
            }
        }

        if let Some((index, source)) = failed {
            warn!(%file_id, index, error = %source, "ingest: fragment write failed, rolling back");
            self.rollback(file_id, fragment_total).await;
            return Err(EngineError::IngestFailed { index, source });
        }

        let (record, manifest) = build_manifest(file_id, filename, &parts);
        if let Err(e) = self.meta.commit(&record, &manifest) {
            warn!(%file_id, error = %e, "ingest: manifest commit failed, rolling back");
            self.rollback(file_id, fragment_total).await;
            return Err(e.into());
        }

        info!(
            %file_id,
            fragments = record.fragment_count,
            total_size = record.total_size,
            "ingest: committed"
        );
        Ok(record)
    }

    /// Best-effort deletion of every fragment written for an aborted
    /// ingest: the derived keys first, then a prefix sweep for strays.
    async fn rollback(&self, file_id: FileId, fragment_total: u32) {
        for index in 0..fragment_total {
            let key = FragmentKey::new(file_id, index);
            if let Err(e) = self.store.delete(&key).await {
                warn!(%key, error = %e, "rollback: fragment delete failed");
            }
        }
        match self.store.list_file(file_id).await {
            Ok(strays) => {
                for key in strays {
                    if let Err(e) = self.store.delete(&key).await {
                        warn!(%key, error = %e, "rollback: stray delete failed");
                    }
                }
            }
            Err(e) => warn!(%file_id, error = %e, "rollback: stray sweep failed"),
        }
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Reconstruct a file's exact original bytes.
    ///
    /// Either returns the full payload or an error naming every missing
    /// and corrupt fragment index — never a silent partial result.
    pub async fn retrieve(&self, file_id: FileId) -> Result<Vec<u8>, EngineError> {
        let record = self
            .meta
            .get_record(file_id)?
            .ok_or(EngineError::FileNotFound(file_id))?;
        let manifest = self
            .meta
            .get_manifest(file_id)?
            .ok_or(EngineError::FileNotFound(file_id))?;

        manifest.validate(&record)?;

        debug!(%file_id, fragments = record.fragment_count, "retrieve: reconstructing");
        Reconstructor::new(Arc::clone(&self.store), Arc::clone(&self.io_limit))
            .run(&record, &manifest)
            .await
    }

    /// Retrieve a file's record without fetching any fragment data.
    pub async fn head(&self, file_id: FileId) -> Result<FileRecord, EngineError> {
        self.meta
            .get_record(file_id)?
            .ok_or(EngineError::FileNotFound(file_id))
    }

    /// List the records of all committed files.
    pub async fn list(&self) -> Result<Vec<FileRecord>, EngineError> {
        Ok(self.meta.list_records()?)
    }

    // ------------------------------------------------------------------
    // Delete path
    // ------------------------------------------------------------------

    /// Remove a file: fragments first (descriptor keys, then a prefix
    /// sweep for strays), record second, manifest last.
    ///
    /// A reader racing this either still resolves the record — and gets a
    /// reconstruction error naming the already-deleted indices — or sees
    /// no file at all. Orphaned fragments referencing a live record are
    /// never left behind.
    pub async fn remove(&self, file_id: FileId) -> Result<(), EngineError> {
        let record = self
            .meta
            .get_record(file_id)?
            .ok_or(EngineError::FileNotFound(file_id))?;

        if let Some(manifest) = self.meta.get_manifest(file_id)? {
            for descriptor in &manifest.fragments {
                self.store
                    .delete(&FragmentKey::new(file_id, descriptor.index))
                    .await?;
            }
        }
        for key in self.store.list_file(file_id).await? {
            self.store.delete(&key).await?;
        }

        self.meta.delete_record(file_id)?;
        self.meta.delete_manifest(file_id)?;

        info!(%file_id, fragments = record.fragment_count, "removed file");
        Ok(())
    }
}
