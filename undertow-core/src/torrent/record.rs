//! Normalized, persisted torrent records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metadata::{FileEntry, TorrentMetadata};
use super::InfoHash;

/// The normalized, storable form of an uploaded torrent.
///
/// Created once on successful upload and deleted as a unit. `info_hash` is
/// immutable once set; the swarm counters (`seeders`, `leechers`,
/// `completed`) are the only fields mutated afterwards, by an external
/// swarm-info updater, which also bumps `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    pub id: Uuid,
    pub info_hash: InfoHash,
    pub filename: String,
    pub description: Option<String>,
    pub uploader: String,
    pub file_size: u64,
    pub piece_length: u32,
    /// Hex-encoded 20-byte piece hashes, in declaration order.
    pub pieces: Vec<String>,
    /// Present iff the torrent declared a multi-file layout.
    pub files: Option<Vec<FileEntry>>,
    pub seeders: u32,
    pub leechers: u32,
    pub completed: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TorrentRecord {
    /// Assembles a new record from extracted metadata and caller context.
    ///
    /// Swarm counters start at zero and both timestamps at the current time.
    /// The info-hash is derived here, from the metadata's original `info`
    /// value, and never changes afterwards.
    pub fn build(
        metadata: &TorrentMetadata,
        description: Option<String>,
        uploader: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            info_hash: metadata.info_hash(),
            filename: metadata.name.clone(),
            description,
            uploader,
            file_size: metadata.total_size,
            piece_length: metadata.piece_length,
            pieces: metadata.piece_hashes.clone(),
            files: metadata.files.clone(),
            seeders: 0,
            leechers: 0,
            completed: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of pieces stored for this record.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }
}
