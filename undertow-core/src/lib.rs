//! Undertow Core - Torrent metadata pipeline and record storage
//!
//! This crate provides the fundamental building blocks of the Undertow
//! torrent index: the bencode codec, torrent metadata extraction and
//! validation, info-hash derivation, normalized record construction,
//! torrent reconstruction, and the record storage interface.

pub mod bencode;
pub mod catalog;
pub mod config;
pub mod storage;
pub mod torrent;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use bencode::{BencodeError, Value};
pub use catalog::TorrentCatalog;
pub use config::UndertowConfig;
pub use storage::{InMemoryTorrentStore, StorageError, TorrentStore};
pub use torrent::{InfoHash, TorrentError, TorrentMetadata, TorrentRecord};

/// Core errors that can bubble up from any Undertow subsystem.
#[derive(Debug, thiserror::Error)]
pub enum UndertowError {
    #[error("Torrent error: {0}")]
    Torrent(#[from] TorrentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UndertowError>;
