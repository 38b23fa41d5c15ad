//! End-to-end tests for the metadata pipeline: decode, extract, hash, store,
//! and reconstruct.

use std::sync::Arc;

use sha1::{Digest, Sha1};
use undertow_core::config::TrackerConfig;
use undertow_core::storage::InMemoryTorrentStore;
use undertow_core::{InfoHash, TorrentCatalog, TorrentError, bencode};

const SINGLE_FILE: &[u8] =
    b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee";

fn catalog() -> TorrentCatalog {
    TorrentCatalog::new(Arc::new(InMemoryTorrentStore::new()), TrackerConfig::default())
}

fn multi_file_payload() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"d4:infod");
    payload.extend_from_slice(b"5:filesl");
    payload.extend_from_slice(b"d6:lengthi100e4:pathl3:dir5:a.mp3ee");
    payload.extend_from_slice(b"d6:lengthi200e4:pathl5:b.txtee");
    payload.extend_from_slice(b"e");
    payload.extend_from_slice(b"4:name3:two");
    payload.extend_from_slice(b"12:piece lengthi16384e");
    payload.extend_from_slice(b"6:pieces20:bbbbbbbbbbbbbbbbbbbb");
    payload.extend_from_slice(b"ee");
    payload
}

#[tokio::test]
async fn test_upload_then_download_round_trip() {
    let catalog = catalog();

    let record = catalog
        .add_torrent(SINGLE_FILE, Some("tiny".to_string()), "admin".to_string())
        .await
        .unwrap();

    assert_eq!(record.filename, "a.js");
    assert_eq!(record.file_size, 1024);
    assert_eq!(record.piece_length, 16384);
    assert_eq!(record.piece_count(), 1);
    assert_eq!(record.pieces[0], hex::encode(b"aaaaaaaaaaaaaaaaaaaa"));
    assert!(record.files.is_none());
    assert_eq!(record.uploader, "admin");
    assert_eq!((record.seeders, record.leechers, record.completed), (0, 0, 0));

    // The stored hash is the SHA-1 of the info dictionary exactly as it
    // appeared on the wire.
    let info_slice = &SINGLE_FILE[7..SINGLE_FILE.len() - 1];
    let expected = hex::encode(Sha1::digest(info_slice));
    assert_eq!(record.info_hash.to_string(), expected);

    // Reconstruction yields a valid torrent whose info dictionary re-hashes
    // to the stored value.
    let (_, bytes) = catalog.torrent_file(record.id).await.unwrap();
    let root = bencode::decode(&bytes).unwrap();
    let dict = root.as_dictionary().unwrap();
    assert!(dict.contains_key(b"announce".as_slice()));
    let info = dict.get(b"info".as_slice()).unwrap();
    assert_eq!(InfoHash::of_value(info), record.info_hash);
}

#[tokio::test]
async fn test_duplicate_upload_conflicts() {
    let catalog = catalog();
    catalog
        .add_torrent(SINGLE_FILE, None, "admin".to_string())
        .await
        .unwrap();

    let err = catalog
        .add_torrent(SINGLE_FILE, None, "other".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, TorrentError::Duplicate { .. }));
}

#[tokio::test]
async fn test_info_hash_ignores_announce() {
    // Two wrappers around the same info dictionary, different outer keys.
    let mut with_announce = Vec::new();
    with_announce.extend_from_slice(b"d8:announce18:http://tracker/ann");
    with_announce.extend_from_slice(&SINGLE_FILE[1..]);

    let catalog = catalog();
    let plain = catalog
        .add_torrent(SINGLE_FILE, None, "admin".to_string())
        .await
        .unwrap();

    let err = catalog
        .add_torrent(&with_announce, None, "admin".to_string())
        .await
        .unwrap_err();
    match err {
        TorrentError::Duplicate { info_hash } => assert_eq!(info_hash, plain.info_hash),
        other => panic!("expected duplicate, got {other:?}"),
    }
}

#[tokio::test]
async fn test_multi_file_pipeline() {
    let catalog = catalog();
    let record = catalog
        .add_torrent(&multi_file_payload(), None, "admin".to_string())
        .await
        .unwrap();

    assert_eq!(record.file_size, 300);
    let files = record.files.as_ref().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path, "dir/a.mp3");
    assert_eq!(files[1].path, "b.txt");

    // Reconstruction preserves the file list and the hash.
    let (_, bytes) = catalog.torrent_file(record.id).await.unwrap();
    let root = bencode::decode(&bytes).unwrap();
    let info = root.as_dictionary().unwrap().get(b"info".as_slice()).unwrap();
    assert_eq!(InfoHash::of_value(info), record.info_hash);
    let info_dict = info.as_dictionary().unwrap();
    assert!(info_dict.contains_key(b"files".as_slice()));
    assert!(!info_dict.contains_key(b"length".as_slice()));
}

#[tokio::test]
async fn test_length_and_files_are_mutually_exclusive() {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"d4:infod");
    payload.extend_from_slice(b"5:filesld6:lengthi100e4:pathl1:aeee");
    payload.extend_from_slice(b"6:lengthi100e");
    payload.extend_from_slice(b"4:name1:x");
    payload.extend_from_slice(b"12:piece lengthi16384e");
    payload.extend_from_slice(b"6:pieces20:cccccccccccccccccccc");
    payload.extend_from_slice(b"ee");

    let err = catalog()
        .add_torrent(&payload, None, "admin".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, TorrentError::InvalidMetadata { .. }));
}

#[tokio::test]
async fn test_pieces_blob_slices_into_hex_hashes() {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"d4:infod6:lengthi49152e4:name1:x12:piece lengthi16384e6:pieces60:");
    payload.extend_from_slice(&[0x11; 20]);
    payload.extend_from_slice(&[0x22; 20]);
    payload.extend_from_slice(&[0x33; 20]);
    payload.extend_from_slice(b"ee");

    let record = catalog()
        .add_torrent(&payload, None, "admin".to_string())
        .await
        .unwrap();
    assert_eq!(record.piece_count(), 3);
    assert_eq!(record.pieces[0], "11".repeat(20));
    assert_eq!(record.pieces[1], "22".repeat(20));
    assert_eq!(record.pieces[2], "33".repeat(20));
}

#[tokio::test]
async fn test_swarm_update_preserves_metadata() {
    let catalog = catalog();
    let record = catalog
        .add_torrent(SINGLE_FILE, None, "admin".to_string())
        .await
        .unwrap();

    let updated = catalog.update_swarm(record.id, 5, 3, Some(12)).await.unwrap();
    assert_eq!((updated.seeders, updated.leechers, updated.completed), (5, 3, 12));
    assert_eq!(updated.info_hash, record.info_hash);
    assert!(updated.updated_at >= record.updated_at);

    // The rebuilt torrent is unaffected by counter churn.
    let (_, bytes) = catalog.torrent_file(record.id).await.unwrap();
    let info = bencode::decode(&bytes)
        .unwrap()
        .as_dictionary()
        .unwrap()
        .get(b"info".as_slice())
        .cloned()
        .unwrap();
    assert_eq!(InfoHash::of_value(&info), record.info_hash);
}
