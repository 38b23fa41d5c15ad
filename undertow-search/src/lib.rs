//! Full-text search layer for the torrent catalog.
//!
//! Keeps a denormalized projection of torrent records and answers
//! field-weighted queries over filename, description, and info-hash. The
//! backend sits behind [`SearchIndex`] so a remote engine can replace the
//! in-memory implementation without touching callers.

pub mod errors;
pub mod service;
pub mod types;

pub use errors::SearchError;
pub use service::{InMemorySearchIndex, SearchIndex};
pub use types::{SearchHit, TorrentDocument};

/// Convenience alias for search results.
pub type Result<T> = std::result::Result<T, SearchError>;
