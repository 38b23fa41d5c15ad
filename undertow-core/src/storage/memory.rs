//! In-memory record store.
//!
//! Reference implementation of [`TorrentStore`] for development and tests.
//! A single write lock covers the record map and the info-hash index, so the
//! uniqueness check and the insert are atomic and the two maps never
//! disagree.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{StorageError, TorrentStore};
use crate::torrent::{InfoHash, TorrentRecord};

#[derive(Default)]
struct Tables {
    records: HashMap<Uuid, TorrentRecord>,
    by_info_hash: HashMap<InfoHash, Uuid>,
}

/// HashMap-backed store with an info-hash uniqueness index.
#[derive(Default)]
pub struct InMemoryTorrentStore {
    tables: RwLock<Tables>,
}

impl InMemoryTorrentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.tables.read().records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TorrentStore for InMemoryTorrentStore {
    async fn insert(&self, record: TorrentRecord) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if tables.by_info_hash.contains_key(&record.info_hash) {
            return Err(StorageError::DuplicateInfoHash {
                info_hash: record.info_hash,
            });
        }
        tables.by_info_hash.insert(record.info_hash, record.id);
        tables.records.insert(record.id, record);
        Ok(())
    }

    async fn record(&self, id: Uuid) -> Result<TorrentRecord, StorageError> {
        self.tables
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(StorageError::RecordNotFound { id })
    }

    async fn record_by_info_hash(
        &self,
        info_hash: InfoHash,
    ) -> Result<Option<TorrentRecord>, StorageError> {
        let tables = self.tables.read();
        Ok(tables
            .by_info_hash
            .get(&info_hash)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn remove(&self, id: Uuid) -> Result<TorrentRecord, StorageError> {
        let mut tables = self.tables.write();
        let record = tables
            .records
            .remove(&id)
            .ok_or(StorageError::RecordNotFound { id })?;
        tables.by_info_hash.remove(&record.info_hash);
        Ok(record)
    }

    async fn update_swarm(
        &self,
        id: Uuid,
        seeders: u32,
        leechers: u32,
        completed: Option<u32>,
    ) -> Result<TorrentRecord, StorageError> {
        let mut tables = self.tables.write();
        let record = tables
            .records
            .get_mut(&id)
            .ok_or(StorageError::RecordNotFound { id })?;
        record.seeders = seeders;
        record.leechers = leechers;
        if let Some(completed) = completed {
            record.completed = completed;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}
