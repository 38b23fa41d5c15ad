//! Torrent metadata pipeline: extraction, identity, records, reconstruction.

pub mod metadata;
pub mod reconstruct;
pub mod record;

use std::fmt;

use sha1::{Digest, Sha1};

pub use metadata::{FileEntry, TorrentMetadata};
pub use reconstruct::rebuild_torrent;
pub use record::TorrentRecord;

use crate::bencode::{self, BencodeError, Value};
use crate::storage::StorageError;

/// SHA-1 hash identifying a unique torrent.
///
/// 20-byte SHA-1 digest of the canonical bencode encoding of a torrent's
/// `info` dictionary. Two uploads with byte-identical `info` dictionaries
/// produce the same hash regardless of outer keys like `announce`.
/// Rendered and serialized as the 40-character lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates InfoHash from a 20-byte SHA-1 digest.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Computes the info-hash of an `info` dictionary value.
    ///
    /// Hashes the canonical re-encoding of the value exactly as it was
    /// decoded. Callers must pass the originally decoded `info` sub-value,
    /// never one rebuilt from normalized fields, or the hash will not match
    /// what reference clients compute from the same file.
    pub fn of_value(info: &Value) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bencode::encode(info));
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&hasher.finalize());
        Self(hash)
    }

    /// Parses a 40-character hex string into an InfoHash.
    ///
    /// # Errors
    ///
    /// - `hex::FromHexError` - Wrong length or non-hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let mut hash = [0u8; 20];
        hex::decode_to_slice(hex_str, &mut hash)?;
        Ok(Self(hash))
    }

    /// Returns reference to the underlying 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl serde::Serialize for InfoHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for InfoHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur in the torrent metadata pipeline.
///
/// Decode failures mean the input is not well-formed bencode; metadata
/// failures mean well-formed bencode that is not a valid torrent. Neither
/// is retried: malformed input does not become valid on retry.
#[derive(Debug, thiserror::Error)]
pub enum TorrentError {
    #[error("malformed bencode: {0}")]
    Decode(#[from] BencodeError),

    #[error("invalid torrent metadata: {reason}")]
    InvalidMetadata { reason: String },

    #[error("torrent {info_hash} already exists")]
    Duplicate { info_hash: InfoHash },

    #[error("torrent {id} not found")]
    RecordNotFound { id: uuid::Uuid },

    #[error("corrupt stored record: {reason}")]
    CorruptRecord { reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TorrentError {
    fn invalid(reason: impl Into<String>) -> Self {
        TorrentError::InvalidMetadata {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_hash_display() {
        let hash = [
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab,
            0xcd, 0xef, 0x01, 0x23, 0x45, 0x67,
        ];
        let info_hash = InfoHash::new(hash);
        assert_eq!(
            info_hash.to_string(),
            "0123456789abcdef0123456789abcdef01234567"
        );
    }

    #[test]
    fn test_info_hash_hex_round_trip() {
        let info_hash = InfoHash::new([0x5a; 20]);
        let parsed = InfoHash::from_hex(&info_hash.to_string()).unwrap();
        assert_eq!(parsed, info_hash);
    }

    #[test]
    fn test_info_hash_from_hex_rejects_bad_input() {
        assert!(InfoHash::from_hex("deadbeef").is_err());
        assert!(InfoHash::from_hex("zz23456789abcdef0123456789abcdef01234567").is_err());
    }

    #[test]
    fn test_info_hash_serde_as_hex_string() {
        let info_hash = InfoHash::new([0xab; 20]);
        let json = serde_json::to_string(&info_hash).unwrap();
        assert_eq!(json, format!("\"{info_hash}\""));
        let back: InfoHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info_hash);
    }

    #[test]
    fn test_of_value_is_deterministic() {
        let info = crate::bencode::decode(
            b"d6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaae",
        )
        .unwrap();
        assert_eq!(InfoHash::of_value(&info), InfoHash::of_value(&info));
    }

    #[test]
    fn test_of_value_changes_with_content() {
        let info_a = crate::bencode::decode(b"d4:name4:a.jse").unwrap();
        let info_b = crate::bencode::decode(b"d4:name4:b.jse").unwrap();
        assert_ne!(InfoHash::of_value(&info_a), InfoHash::of_value(&info_b));
    }
}
