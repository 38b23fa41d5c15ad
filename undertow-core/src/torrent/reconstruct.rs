//! Torrent reconstruction: the inverse of the upload pipeline.
//!
//! Rebuilds a downloadable `.torrent` byte stream from a stored record. The
//! outer dictionary is synthesized (`announce`, `creation date`, `created
//! by` come from configuration and the record's timestamp, not from the
//! original upload), but the rebuilt `info` sub-value re-hashes to exactly
//! the stored `info_hash`, because it is assembled from the same normalized
//! fields that were canonically extracted at upload time.

use std::collections::BTreeMap;

use super::record::TorrentRecord;
use super::TorrentError;
use crate::bencode::{self, Value};

/// Rebuilds the canonical `.torrent` bytes for a stored record.
///
/// # Errors
///
/// - `TorrentError::CorruptRecord` - A stored piece hash is not valid hex
///   (cannot happen for records produced by the extractor)
pub fn rebuild_torrent(
    record: &TorrentRecord,
    announce_url: &str,
    created_by: &str,
) -> Result<Vec<u8>, TorrentError> {
    let mut info = BTreeMap::new();
    info.insert(b"name".to_vec(), Value::bytes(record.filename.as_bytes()));
    info.insert(
        b"piece length".to_vec(),
        Value::Integer(i64::from(record.piece_length)),
    );

    let mut pieces_blob = Vec::with_capacity(record.pieces.len() * 20);
    for piece in &record.pieces {
        let raw = hex::decode(piece).map_err(|_| TorrentError::CorruptRecord {
            reason: format!("piece hash '{piece}' is not valid hex"),
        })?;
        pieces_blob.extend_from_slice(&raw);
    }
    info.insert(b"pieces".to_vec(), Value::Bytes(pieces_blob));

    match &record.files {
        Some(files) => {
            let entries = files
                .iter()
                .map(|file| {
                    let mut entry = BTreeMap::new();
                    entry.insert(b"length".to_vec(), Value::Integer(file.length as i64));
                    // Re-split the display path into the declared segments.
                    let segments = file
                        .path
                        .split('/')
                        .map(|segment| Value::bytes(segment.as_bytes()))
                        .collect();
                    entry.insert(b"path".to_vec(), Value::List(segments));
                    Value::Dictionary(entry)
                })
                .collect();
            info.insert(b"files".to_vec(), Value::List(entries));
        }
        None => {
            info.insert(b"length".to_vec(), Value::Integer(record.file_size as i64));
        }
    }

    let mut root = BTreeMap::new();
    root.insert(b"announce".to_vec(), Value::bytes(announce_url.as_bytes()));
    root.insert(b"created by".to_vec(), Value::bytes(created_by.as_bytes()));
    root.insert(
        b"creation date".to_vec(),
        Value::Integer(record.created_at.timestamp()),
    );
    root.insert(b"info".to_vec(), Value::Dictionary(info));

    Ok(bencode::encode(&Value::Dictionary(root)))
}

#[cfg(test)]
mod tests {
    use super::super::metadata::TorrentMetadata;
    use super::super::InfoHash;
    use super::*;

    const ANNOUNCE: &str = "http://localhost/announce";
    const CREATED_BY: &str = "undertow";

    fn record_from(payload: &[u8]) -> TorrentRecord {
        let metadata = TorrentMetadata::from_bytes(payload).unwrap();
        TorrentRecord::build(&metadata, None, "admin".to_string())
    }

    #[test]
    fn test_rebuilt_stream_is_decodable() {
        let record = record_from(
            b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee",
        );
        let bytes = rebuild_torrent(&record, ANNOUNCE, CREATED_BY).unwrap();
        let root = bencode::decode(&bytes).unwrap();
        let entries = root.as_dictionary().unwrap();
        assert_eq!(
            entries[b"announce".as_slice()].as_bytes(),
            Some(ANNOUNCE.as_bytes())
        );
        assert_eq!(
            entries[b"created by".as_slice()].as_bytes(),
            Some(CREATED_BY.as_bytes())
        );
        assert_eq!(
            entries[b"creation date".as_slice()].as_integer(),
            Some(record.created_at.timestamp())
        );
    }

    #[test]
    fn test_rebuilt_info_rehashes_to_stored_hash() {
        let record = record_from(
            b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee",
        );
        let bytes = rebuild_torrent(&record, ANNOUNCE, CREATED_BY).unwrap();
        let root = bencode::decode(&bytes).unwrap();
        let info = &root.as_dictionary().unwrap()[b"info".as_slice()];
        assert_eq!(InfoHash::of_value(info), record.info_hash);
    }

    #[test]
    fn test_multi_file_rebuild_restores_path_segments() {
        let record = record_from(
            b"d4:infod5:filesl\
              d6:lengthi524288e4:pathl3:sub9:file1.txteed6:lengthi1048576e4:pathl9:file2.dateee\
              4:name8:test.dir12:piece lengthi32768e6:pieces40:\
              aaaaaaaaaaaaaaaaaaaabbbbbbbbbbbbbbbbbbbbee",
        );
        let bytes = rebuild_torrent(&record, ANNOUNCE, CREATED_BY).unwrap();
        let root = bencode::decode(&bytes).unwrap();
        let info = root.as_dictionary().unwrap()[b"info".as_slice()]
            .as_dictionary()
            .unwrap();
        let files = info[b"files".as_slice()].as_list().unwrap();
        assert_eq!(files.len(), 2);
        let first_path = files[0].as_dictionary().unwrap()[b"path".as_slice()]
            .as_list()
            .unwrap();
        assert_eq!(first_path[0].as_bytes(), Some(b"sub".as_slice()));
        assert_eq!(first_path[1].as_bytes(), Some(b"file1.txt".as_slice()));

        // The multi-file info hash survives the round trip too.
        assert_eq!(
            InfoHash::of_value(&root.as_dictionary().unwrap()[b"info".as_slice()]),
            record.info_hash
        );
    }

    #[test]
    fn test_corrupt_piece_hash_is_reported() {
        let mut record = record_from(
            b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee",
        );
        record.pieces[0] = "not-hex".to_string();
        let err = rebuild_torrent(&record, ANNOUNCE, CREATED_BY).unwrap_err();
        assert!(matches!(err, TorrentError::CorruptRecord { .. }));
    }
}
