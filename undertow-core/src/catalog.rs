//! Torrent catalog: the upload and download pipelines behind one type.
//!
//! Upload: raw bytes -> decode -> extract/validate -> info-hash ->
//! record build -> store insert. Download: store read -> rebuild value
//! tree -> canonical encode. The codec, extractor, and reconstructor are
//! pure; the store is the only shared mutable resource and the catalog
//! treats its uniqueness constraint as authoritative.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::storage::{StorageError, TorrentStore};
use crate::torrent::{rebuild_torrent, TorrentError, TorrentMetadata, TorrentRecord};

/// Front door for all record operations.
#[derive(Clone)]
pub struct TorrentCatalog {
    store: Arc<dyn TorrentStore>,
    tracker: TrackerConfig,
}

impl TorrentCatalog {
    /// Creates a catalog over the given store and tracker configuration.
    pub fn new(store: Arc<dyn TorrentStore>, tracker: TrackerConfig) -> Self {
        Self { store, tracker }
    }

    /// Runs the full upload pipeline for a raw `.torrent` payload.
    ///
    /// The uniqueness pre-check and the insert are not atomic as a pair; a
    /// racing duplicate that slips past the pre-check surfaces as the
    /// store's constraint violation and is reported as the same conflict.
    ///
    /// # Errors
    ///
    /// - `TorrentError::Decode` - Payload is not well-formed bencode
    /// - `TorrentError::InvalidMetadata` - Payload is not a valid torrent
    /// - `TorrentError::Duplicate` - A record with this info-hash exists
    pub async fn add_torrent(
        &self,
        torrent_bytes: &[u8],
        description: Option<String>,
        uploader: String,
    ) -> Result<TorrentRecord, TorrentError> {
        let metadata = TorrentMetadata::from_bytes(torrent_bytes)?;
        let info_hash = metadata.info_hash();

        if self
            .store
            .record_by_info_hash(info_hash)
            .await
            .map_err(map_storage)?
            .is_some()
        {
            return Err(TorrentError::Duplicate { info_hash });
        }

        let record = TorrentRecord::build(&metadata, description, uploader);
        self.store
            .insert(record.clone())
            .await
            .map_err(map_storage)?;

        tracing::info!(
            %info_hash,
            id = %record.id,
            filename = %record.filename,
            file_size = record.file_size,
            pieces = record.piece_count(),
            "torrent record created"
        );
        Ok(record)
    }

    /// Loads a record by identifier.
    ///
    /// # Errors
    ///
    /// - `TorrentError::RecordNotFound` - No record with this identifier
    pub async fn torrent(&self, id: Uuid) -> Result<TorrentRecord, TorrentError> {
        self.store.record(id).await.map_err(map_storage)
    }

    /// Rebuilds the downloadable `.torrent` stream for a record.
    ///
    /// Returns the record alongside the bytes so callers can name the
    /// attachment without a second lookup.
    ///
    /// # Errors
    ///
    /// - `TorrentError::RecordNotFound` - No record with this identifier
    /// - `TorrentError::CorruptRecord` - Stored piece hashes are not hex
    pub async fn torrent_file(&self, id: Uuid) -> Result<(TorrentRecord, Vec<u8>), TorrentError> {
        let record = self.torrent(id).await?;
        let bytes = rebuild_torrent(&record, &self.tracker.announce_url, self.tracker.created_by)?;
        Ok((record, bytes))
    }

    /// Deletes a record as a unit.
    ///
    /// # Errors
    ///
    /// - `TorrentError::RecordNotFound` - No record with this identifier
    pub async fn remove(&self, id: Uuid) -> Result<TorrentRecord, TorrentError> {
        let record = self.store.remove(id).await.map_err(map_storage)?;
        tracing::info!(id = %record.id, info_hash = %record.info_hash, "torrent record deleted");
        Ok(record)
    }

    /// Applies externally supplied swarm counters to a record.
    ///
    /// # Errors
    ///
    /// - `TorrentError::RecordNotFound` - No record with this identifier
    pub async fn update_swarm(
        &self,
        id: Uuid,
        seeders: u32,
        leechers: u32,
        completed: Option<u32>,
    ) -> Result<TorrentRecord, TorrentError> {
        self.store
            .update_swarm(id, seeders, leechers, completed)
            .await
            .map_err(map_storage)
    }
}

/// Storage failures carry their own record/conflict meaning; fold them into
/// the pipeline taxonomy so callers see one error surface.
fn map_storage(err: StorageError) -> TorrentError {
    match err {
        StorageError::RecordNotFound { id } => TorrentError::RecordNotFound { id },
        StorageError::DuplicateInfoHash { info_hash } => TorrentError::Duplicate { info_hash },
        other => TorrentError::Storage(other),
    }
}
