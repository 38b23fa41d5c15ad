//! Data types for the search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use undertow_core::{InfoHash, TorrentRecord};
use uuid::Uuid;

/// Denormalized search projection of a torrent record.
///
/// Carries everything the search surface returns, keyed by the record
/// identifier. The `pieces` and `files` blobs are deliberately excluded;
/// they are download-path data, not search data. Swarm counters are
/// updatable independently of the rest of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentDocument {
    pub id: Uuid,
    pub info_hash: InfoHash,
    pub filename: String,
    pub description: Option<String>,
    pub file_size: u64,
    pub piece_length: u32,
    pub seeders: u32,
    pub leechers: u32,
    pub completed: u32,
    pub uploader: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TorrentRecord> for TorrentDocument {
    fn from(record: &TorrentRecord) -> Self {
        Self {
            id: record.id,
            info_hash: record.info_hash,
            filename: record.filename.clone(),
            description: record.description.clone(),
            file_size: record.file_size,
            piece_length: record.piece_length,
            seeders: record.seeders,
            leechers: record.leechers,
            completed: record.completed,
            uploader: record.uploader.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// A matched document with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f32,
    #[serde(flatten)]
    pub document: TorrentDocument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use undertow_core::TorrentMetadata;

    #[test]
    fn test_projection_excludes_blobs() {
        let metadata = TorrentMetadata::from_bytes(
            b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee",
        )
        .unwrap();
        let record = TorrentRecord::build(&metadata, Some("desc".to_string()), "admin".to_string());
        let doc = TorrentDocument::from(&record);

        assert_eq!(doc.id, record.id);
        assert_eq!(doc.info_hash, record.info_hash);
        assert_eq!(doc.filename, "a.js");
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("pieces").is_none());
        assert!(json.get("files").is_none());
    }

    #[test]
    fn test_search_hit_flattens_document() {
        let metadata = TorrentMetadata::from_bytes(
            b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee",
        )
        .unwrap();
        let record = TorrentRecord::build(&metadata, None, "admin".to_string());
        let hit = SearchHit {
            score: 3.0,
            document: TorrentDocument::from(&record),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["score"], 3.0);
        assert_eq!(json["filename"], "a.js");
    }
}
