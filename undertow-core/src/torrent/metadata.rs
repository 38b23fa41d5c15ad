//! Torrent metadata extraction and validation.
//!
//! Interprets a decoded bencode root as torrent metadata and normalizes it
//! for record construction. The originally decoded `info` sub-value is kept
//! unmodified alongside the normalized fields so the info-hash can be
//! computed from the exact bytes the uploader submitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{InfoHash, TorrentError};
use crate::bencode::{self, Value};

/// One file within a multi-file torrent.
///
/// `path` is the declared path segments joined with `/`, preserving
/// segment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub length: u64,
}

/// Validated, normalized torrent metadata.
///
/// Produced from a decoded root value by [`TorrentMetadata::from_value`].
/// Exactly one of the single-file and multi-file layouts is present:
/// `files` is `Some` iff the torrent declared a `files` list.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentMetadata {
    info: Value,
    pub name: String,
    pub piece_length: u32,
    pub piece_hashes: Vec<String>,
    pub total_size: u64,
    pub files: Option<Vec<FileEntry>>,
}

impl TorrentMetadata {
    /// Decodes raw `.torrent` bytes and extracts metadata.
    ///
    /// # Errors
    ///
    /// - `TorrentError::Decode` - Input is not well-formed bencode
    /// - `TorrentError::InvalidMetadata` - Well-formed bencode that is not a
    ///   valid torrent (missing or contradictory keys)
    pub fn from_bytes(torrent_bytes: &[u8]) -> Result<Self, TorrentError> {
        let root = bencode::decode(torrent_bytes)?;
        Self::from_value(root)
    }

    /// Extracts metadata from a decoded root value.
    ///
    /// Validation order: root must be a dictionary containing `info`; `info`
    /// must carry `name`, a positive `piece length`, and a `pieces` blob
    /// whose length is a multiple of 20; exactly one of `length` (single
    /// file) or a non-empty `files` list (multi file) must be present.
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidMetadata` - Any rule above is violated; the
    ///   message names the offending key
    pub fn from_value(root: Value) -> Result<Self, TorrentError> {
        let root_entries = root
            .as_dictionary()
            .ok_or_else(|| TorrentError::invalid("root value must be a dictionary"))?;

        let info = root_entries
            .get(b"info".as_slice())
            .ok_or_else(|| TorrentError::invalid("missing 'info' field"))?
            .clone();
        let info_entries = info
            .as_dictionary()
            .ok_or_else(|| TorrentError::invalid("'info' must be a dictionary"))?;

        let name = require_text(info_entries, b"name")?;
        let piece_length = require_integer(info_entries, b"piece length")?;
        if piece_length <= 0 || piece_length > i64::from(u32::MAX) {
            return Err(TorrentError::invalid(
                "'piece length' must be a positive 32-bit integer",
            ));
        }

        let pieces_blob = require_bytes(info_entries, b"pieces")?;
        if !pieces_blob.len().is_multiple_of(20) {
            return Err(TorrentError::invalid(
                "'pieces' length must be a multiple of 20 bytes",
            ));
        }
        let piece_hashes: Vec<String> = pieces_blob.chunks(20).map(hex::encode).collect();

        let single_length = info_entries.get(b"length".as_slice());
        let files_list = info_entries.get(b"files".as_slice());
        let (total_size, files) = match (single_length, files_list) {
            (Some(_), Some(_)) => {
                return Err(TorrentError::invalid(
                    "'length' and 'files' are mutually exclusive",
                ));
            }
            (None, None) => {
                return Err(TorrentError::invalid("missing 'length' or 'files' field"));
            }
            (Some(length), None) => {
                let length = length
                    .as_integer()
                    .filter(|&n| n >= 0)
                    .ok_or_else(|| {
                        TorrentError::invalid("'length' must be a non-negative integer")
                    })?;
                (length as u64, None)
            }
            (None, Some(files)) => {
                let (total, entries) = extract_files(files)?;
                (total, Some(entries))
            }
        };

        Ok(Self {
            info,
            name,
            piece_length: piece_length as u32,
            piece_hashes,
            total_size,
            files,
        })
    }

    /// The originally decoded `info` sub-value, unmodified.
    ///
    /// This is the value the info-hash is derived from; it must never be
    /// rebuilt from the normalized fields.
    pub fn info(&self) -> &Value {
        &self.info
    }

    /// Derives the canonical content identifier for this torrent.
    pub fn info_hash(&self) -> InfoHash {
        InfoHash::of_value(&self.info)
    }

    /// Number of pieces declared by the torrent.
    pub fn piece_count(&self) -> usize {
        self.piece_hashes.len()
    }
}

/// Walks a `files` list, summing lengths and joining path segments.
fn extract_files(files: &Value) -> Result<(u64, Vec<FileEntry>), TorrentError> {
    let files = files
        .as_list()
        .ok_or_else(|| TorrentError::invalid("'files' must be a list"))?;
    if files.is_empty() {
        return Err(TorrentError::invalid("'files' must be a non-empty list"));
    }

    let mut entries = Vec::with_capacity(files.len());
    let mut total_size = 0u64;
    for file in files {
        let file_entries = file
            .as_dictionary()
            .ok_or_else(|| TorrentError::invalid("'files' entries must be dictionaries"))?;

        let length = require_integer(file_entries, b"length")?;
        if length < 0 {
            return Err(TorrentError::invalid(
                "file 'length' must be a non-negative integer",
            ));
        }
        total_size = total_size
            .checked_add(length as u64)
            .ok_or_else(|| TorrentError::invalid("total file size overflows 64 bits"))?;

        let segments = file_entries
            .get(b"path".as_slice())
            .and_then(Value::as_list)
            .ok_or_else(|| TorrentError::invalid("file entry missing 'path' list"))?;
        if segments.is_empty() {
            return Err(TorrentError::invalid("file 'path' must be non-empty"));
        }
        let mut path_parts = Vec::with_capacity(segments.len());
        for segment in segments {
            let bytes = segment
                .as_bytes()
                .ok_or_else(|| TorrentError::invalid("'path' segments must be byte strings"))?;
            let part = String::from_utf8(bytes.to_vec()).map_err(|_| {
                TorrentError::invalid("'path' segment is not valid UTF-8")
            })?;
            path_parts.push(part);
        }

        entries.push(FileEntry {
            path: path_parts.join("/"),
            length: length as u64,
        });
    }

    Ok((total_size, entries))
}

fn require_bytes<'a>(
    entries: &'a BTreeMap<Vec<u8>, Value>,
    key: &[u8],
) -> Result<&'a [u8], TorrentError> {
    entries
        .get(key)
        .and_then(Value::as_bytes)
        .ok_or_else(|| {
            TorrentError::invalid(format!(
                "missing or invalid field: {}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn require_integer(entries: &BTreeMap<Vec<u8>, Value>, key: &[u8]) -> Result<i64, TorrentError> {
    entries
        .get(key)
        .and_then(Value::as_integer)
        .ok_or_else(|| {
            TorrentError::invalid(format!(
                "missing or invalid integer field: {}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn require_text(entries: &BTreeMap<Vec<u8>, Value>, key: &[u8]) -> Result<String, TorrentError> {
    let bytes = require_bytes(entries, key)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| {
        TorrentError::invalid(format!(
            "invalid UTF-8 in field: {}",
            String::from_utf8_lossy(key)
        ))
    })
}
