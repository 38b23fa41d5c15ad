//! Error types for the search index collaborator.

use thiserror::Error;

/// Errors that can occur during search index operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Indexing a document failed.
    #[error("Failed to index torrent {id}: {reason}")]
    IndexFailed {
        /// Identifier of the record being indexed
        id: uuid::Uuid,
        /// The reason for the failure
        reason: String,
    },

    /// A search query could not be executed.
    #[error("Search failed for query '{query}': {reason}")]
    SearchFailed {
        /// The search query that failed
        query: String,
        /// The reason for the failure
        reason: String,
    },

    /// The index backend is unreachable.
    #[error("Search index unavailable: {reason}")]
    Unavailable {
        /// The reason the backend is unreachable
        reason: String,
    },
}
