//! In-memory vector store with a cosine-similarity scan
//!
//! Used by the test suite and small single-process deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::Result;

use super::vector_store::{SearchFilter, VectorPoint, VectorSearchResult, VectorStoreProvider};

/// Brute-force in-memory vector store
#[derive(Default)]
pub struct InMemoryVectorStore {
    points: RwLock<Vec<VectorPoint>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn ensure_collection(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, points: &[VectorPoint]) -> Result<()> {
        let mut store = self.points.write();
        for point in points {
            match store.iter_mut().find(|existing| existing.id == point.id) {
                Some(existing) => *existing = point.clone(),
                None => store.push(point.clone()),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<VectorSearchResult>> {
        let store = self.points.read();

        let mut results: Vec<VectorSearchResult> = store
            .iter()
            .filter(|point| filter.matches(&point.meta))
            .map(|point| VectorSearchResult {
                content: point.content.clone(),
                meta: point.meta,
                chunk_index: point.chunk_index,
                score: cosine_similarity(query, &point.vector),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }

    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize> {
        let mut store = self.points.write();
        let before = store.len();
        store.retain(|point| point.meta.document_id != *document_id);
        Ok(before - store.len())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.points.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
