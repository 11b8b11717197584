//! Vector store provider trait and shared point/result types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::ChunkMeta;

/// One chunk's embedding plus the payload stored alongside it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Point ID; a fresh UUIDv4 per upsert
    pub id: Uuid,
    /// Embedding vector
    pub vector: Vec<f32>,
    /// Chunk text carried in the payload
    pub content: String,
    /// Ownership and position metadata
    pub meta: ChunkMeta,
    /// 0-based chunk position within the document
    pub chunk_index: u32,
}

/// A search hit with its payload and similarity score
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// Chunk text
    pub content: String,
    /// Ownership and position metadata
    pub meta: ChunkMeta,
    /// 0-based chunk position within the document
    pub chunk_index: u32,
    /// Similarity score, higher is more similar
    pub score: f32,
}

/// Metadata filter for searches; user scoping is mandatory
#[derive(Debug, Clone, Copy)]
pub struct SearchFilter {
    /// Only chunks owned by this user are visible
    pub user_id: Uuid,
    /// Narrow to one class
    pub class_id: Option<Uuid>,
    /// Narrow to one document (ignored when class_id is set)
    pub document_id: Option<Uuid>,
}

impl SearchFilter {
    /// Filter scoped to a user only
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            class_id: None,
            document_id: None,
        }
    }

    /// True if `meta` passes this filter. class_id wins over document_id
    /// when both are present.
    pub fn matches(&self, meta: &ChunkMeta) -> bool {
        if meta.user_id != self.user_id {
            return false;
        }
        if let Some(class_id) = self.class_id {
            return meta.class_id == class_id;
        }
        if let Some(document_id) = self.document_id {
            return meta.document_id == document_id;
        }
        true
    }
}

/// Trait for vector storage and filtered similarity search
///
/// Implementations:
/// - `QdrantStore`: Qdrant over REST
/// - `InMemoryVectorStore`: cosine scan for tests and small deployments
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create the backing collection if it does not exist
    async fn ensure_collection(&self, dimensions: usize) -> Result<()>;

    /// Upsert points
    async fn upsert(&self, points: &[VectorPoint]) -> Result<()>;

    /// Search for the `top_k` most similar points passing `filter`
    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Delete all points belonging to a document, returning how many went away
    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize>;

    /// Total number of stored points
    async fn len(&self) -> Result<usize>;

    /// Check if the store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(user: Uuid, class: Uuid, document: Uuid) -> ChunkMeta {
        ChunkMeta {
            user_id: user,
            class_id: class,
            document_id: document,
            page_number: 1,
        }
    }

    #[test]
    fn test_filter_requires_matching_user() {
        let user = Uuid::new_v4();
        let filter = SearchFilter::for_user(user);
        assert!(filter.matches(&meta(user, Uuid::new_v4(), Uuid::new_v4())));
        assert!(!filter.matches(&meta(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())));
    }

    #[test]
    fn test_class_filter_wins_over_document_filter() {
        let user = Uuid::new_v4();
        let class = Uuid::new_v4();
        let document = Uuid::new_v4();
        let filter = SearchFilter {
            user_id: user,
            class_id: Some(class),
            document_id: Some(document),
        };
        // Right class, wrong document: still matches because class wins
        assert!(filter.matches(&meta(user, class, Uuid::new_v4())));
        // Wrong class, right document: rejected
        assert!(!filter.matches(&meta(user, Uuid::new_v4(), document)));
    }
}
