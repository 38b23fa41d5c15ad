//! Search index interface and in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::errors::SearchError;
use crate::types::{SearchHit, TorrentDocument};

/// Field boosts applied when scoring a match, mirroring a weighted
/// multi-field query: filename counts most, description next, info-hash
/// matches least.
const FILENAME_BOOST: f32 = 3.0;
const DESCRIPTION_BOOST: f32 = 2.0;
const INFO_HASH_BOOST: f32 = 1.0;

/// Search index operations consumed by the orchestration layer.
///
/// Upserts and deletes are keyed by the record identifier; swarm counters
/// are updatable without re-submitting the whole document.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Inserts or replaces the document for a record.
    ///
    /// # Errors
    ///
    /// - `SearchError::IndexFailed` - The backend rejected the document
    /// - `SearchError::Unavailable` - The backend cannot be reached
    async fn upsert(&self, document: TorrentDocument) -> Result<(), SearchError>;

    /// Removes a record's document. Removing an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// - `SearchError::Unavailable` - The backend cannot be reached
    async fn delete(&self, id: Uuid) -> Result<(), SearchError>;

    /// Searches filename, description, and info-hash, best matches first.
    ///
    /// # Errors
    ///
    /// - `SearchError::SearchFailed` - The query could not be executed
    /// - `SearchError::Unavailable` - The backend cannot be reached
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Updates a document's swarm counters in place.
    ///
    /// Unknown ids are ignored: the index is a projection and may lag the
    /// record store.
    ///
    /// # Errors
    ///
    /// - `SearchError::Unavailable` - The backend cannot be reached
    async fn update_swarm(
        &self,
        id: Uuid,
        seeders: u32,
        leechers: u32,
        completed: Option<u32>,
    ) -> Result<(), SearchError>;
}

/// In-memory search index for development and tests.
///
/// Case-insensitive substring matching with field boosts; stands in for an
/// external full-text backend behind the same trait.
#[derive(Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<HashMap<Uuid, TorrentDocument>>,
}

impl InMemorySearchIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn score_document(document: &TorrentDocument, query: &str) -> f32 {
    let query = query.to_lowercase();
    let mut score = 0.0;
    if document.filename.to_lowercase().contains(&query) {
        score += FILENAME_BOOST;
    }
    if let Some(description) = &document.description
        && description.to_lowercase().contains(&query)
    {
        score += DESCRIPTION_BOOST;
    }
    if document.info_hash.to_string().contains(&query) {
        score += INFO_HASH_BOOST;
    }
    score
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn upsert(&self, document: TorrentDocument) -> Result<(), SearchError> {
        tracing::debug!(id = %document.id, filename = %document.filename, "document indexed");
        self.documents.write().insert(document.id, document);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), SearchError> {
        if self.documents.write().remove(&id).is_some() {
            tracing::debug!(%id, "document removed from index");
        }
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let documents = self.documents.read();
        let mut hits: Vec<SearchHit> = documents
            .values()
            .filter_map(|document| {
                let score = score_document(document, query);
                (score > 0.0).then(|| SearchHit {
                    score,
                    document: document.clone(),
                })
            })
            .collect();

        // Best score first; newest first among equals.
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.document.created_at.cmp(&a.document.created_at))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn update_swarm(
        &self,
        id: Uuid,
        seeders: u32,
        leechers: u32,
        completed: Option<u32>,
    ) -> Result<(), SearchError> {
        if let Some(document) = self.documents.write().get_mut(&id) {
            document.seeders = seeders;
            document.leechers = leechers;
            if let Some(completed) = completed {
                document.completed = completed;
            }
            document.updated_at = chrono::Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use undertow_core::{TorrentMetadata, TorrentRecord};

    use super::*;

    fn document(name: &str, description: Option<&str>) -> TorrentDocument {
        // One fixed payload; vary only filename/description so tests control
        // what matches.
        let metadata = TorrentMetadata::from_bytes(
            b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee",
        )
        .unwrap();
        let record = TorrentRecord::build(
            &metadata,
            description.map(str::to_string),
            "admin".to_string(),
        );
        let mut doc = TorrentDocument::from(&record);
        doc.id = Uuid::new_v4();
        doc.filename = name.to_string();
        doc
    }

    #[tokio::test]
    async fn test_upsert_and_search_by_filename() {
        let index = InMemorySearchIndex::new();
        index
            .upsert(document("ubuntu-24.04.iso", None))
            .await
            .unwrap();
        index.upsert(document("debian-12.iso", None)).await.unwrap();

        let hits = index.search("ubuntu", 50).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.filename, "ubuntu-24.04.iso");
        assert_eq!(hits[0].score, FILENAME_BOOST);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let index = InMemorySearchIndex::new();
        index
            .upsert(document("Ubuntu-24.04.iso", None))
            .await
            .unwrap();
        assert_eq!(index.search("UBUNTU", 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filename_match_outranks_description_match() {
        let index = InMemorySearchIndex::new();
        index
            .upsert(document("linux.iso", Some("an ubuntu spin")))
            .await
            .unwrap();
        index
            .upsert(document("ubuntu.iso", Some("plain image")))
            .await
            .unwrap();

        let hits = index.search("ubuntu", 50).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.filename, "ubuntu.iso");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_by_info_hash_prefix() {
        let index = InMemorySearchIndex::new();
        let doc = document("something.iso", None);
        let prefix = doc.info_hash.to_string()[..8].to_string();
        index.upsert(doc).await.unwrap();

        let hits = index.search(&prefix, 50).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_limit_is_applied() {
        let index = InMemorySearchIndex::new();
        for i in 0..5 {
            index
                .upsert(document(&format!("ubuntu-{i}.iso"), None))
                .await
                .unwrap();
        }
        assert_eq!(index.search("ubuntu", 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let index = InMemorySearchIndex::new();
        let doc = document("ubuntu.iso", None);
        let id = doc.id;
        index.upsert(doc).await.unwrap();
        index.delete(id).await.unwrap();
        assert!(index.is_empty());
        // Deleting again is a no-op.
        index.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_swarm_changes_counters_only() {
        let index = InMemorySearchIndex::new();
        let doc = document("ubuntu.iso", None);
        let id = doc.id;
        index.upsert(doc).await.unwrap();

        index.update_swarm(id, 4, 2, None).await.unwrap();
        let hits = index.search("ubuntu", 1).await.unwrap();
        assert_eq!(hits[0].document.seeders, 4);
        assert_eq!(hits[0].document.leechers, 2);
        assert_eq!(hits[0].document.completed, 0);

        // Unknown ids are ignored.
        index.update_swarm(Uuid::new_v4(), 9, 9, None).await.unwrap();
    }
}
