//! Durable storage for torrent records.
//!
//! Narrow create/get/delete interface over the normalized record, plus the
//! swarm-counter mutation used by the external updater. Implementations must
//! enforce `info_hash` uniqueness at the storage layer itself: two uploads of
//! the same content can race between the catalog's pre-check and the insert,
//! and the constraint here is what makes the outcome deterministic.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::InMemoryTorrentStore;

use crate::torrent::{InfoHash, TorrentRecord};

/// Record persistence operations consumed by the torrent catalog.
#[async_trait]
pub trait TorrentStore: Send + Sync {
    /// Persists a new record, enforcing `info_hash` uniqueness.
    ///
    /// # Errors
    ///
    /// - `StorageError::DuplicateInfoHash` - A record with the same
    ///   `info_hash` already exists; nothing was mutated
    async fn insert(&self, record: TorrentRecord) -> Result<(), StorageError>;

    /// Loads a record by identifier.
    ///
    /// # Errors
    ///
    /// - `StorageError::RecordNotFound` - No record with this identifier
    async fn record(&self, id: Uuid) -> Result<TorrentRecord, StorageError>;

    /// Looks up a record by its info-hash, if present.
    ///
    /// # Errors
    ///
    /// - `StorageError::Unavailable` - The backing store cannot be reached
    async fn record_by_info_hash(
        &self,
        info_hash: InfoHash,
    ) -> Result<Option<TorrentRecord>, StorageError>;

    /// Deletes a record as a unit, returning the deleted record.
    ///
    /// # Errors
    ///
    /// - `StorageError::RecordNotFound` - No record with this identifier
    async fn remove(&self, id: Uuid) -> Result<TorrentRecord, StorageError>;

    /// Overwrites the swarm counters and bumps `updated_at`.
    ///
    /// The only mutation a stored record ever sees; `completed` is left
    /// unchanged when `None`.
    ///
    /// # Errors
    ///
    /// - `StorageError::RecordNotFound` - No record with this identifier
    async fn update_swarm(
        &self,
        id: Uuid,
        seeders: u32,
        leechers: u32,
        completed: Option<u32>,
    ) -> Result<TorrentRecord, StorageError>;
}

/// Errors that occur during record storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Uniqueness constraint violation on `info_hash`.
    #[error("record with info hash {info_hash} already exists")]
    DuplicateInfoHash {
        /// The conflicting content identifier
        info_hash: InfoHash,
    },

    /// No record exists for the requested identifier.
    #[error("record {id} not found")]
    RecordNotFound {
        /// The identifier that was requested
        id: Uuid,
    },

    /// The backing store is unreachable or failed internally.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Description of the backend failure
        reason: String,
    },
}
