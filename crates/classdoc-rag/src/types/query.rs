//! Query request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A question scoped to a user, optionally narrowed to a class or document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Requesting user; retrieval never crosses user boundaries
    pub user_id: Uuid,

    /// Restrict retrieval to one class
    #[serde(default)]
    pub class_id: Option<Uuid>,

    /// Restrict retrieval to one document (ignored when class_id is set)
    #[serde(default)]
    pub document_id: Option<Uuid>,

    /// Number of chunks to retrieve (default: 5)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl QueryRequest {
    /// Create a query for a user with defaults
    pub fn new(question: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            question: question.into(),
            user_id,
            class_id: None,
            document_id: None,
            top_k: default_top_k(),
        }
    }

    /// Restrict retrieval to a class
    pub fn with_class(mut self, class_id: Uuid) -> Self {
        self.class_id = Some(class_id);
        self
    }

    /// Restrict retrieval to a document
    pub fn with_document(mut self, document_id: Uuid) -> Self {
        self.document_id = Some(document_id);
        self
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Source reference for one retrieved chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Document the chunk came from
    pub document_id: Uuid,
    /// 0-based chunk position within the document
    pub chunk_index: u32,
    /// 1-based page number
    pub page_number: u32,
    /// Similarity score (higher is more similar)
    pub score: f32,
    /// Chunk text used as context
    pub content: String,
}

/// Answer plus the chunks it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,
    /// Retrieved chunks in score order
    pub sources: Vec<ChunkSource>,
    /// Number of chunks retrieved
    pub chunks_retrieved: usize,
    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Response for a query that matched nothing
    pub fn not_found(processing_time_ms: u64) -> Self {
        Self {
            answer: "I couldn't find relevant information in your documents to answer this question."
                .to_string(),
            sources: Vec::new(),
            chunks_retrieved: 0,
            processing_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let user_id = Uuid::new_v4();
        let request = QueryRequest::new("what is osmosis?", user_id);
        assert_eq!(request.top_k, 5);
        assert!(request.class_id.is_none());

        let class_id = Uuid::new_v4();
        let request = request.with_class(class_id).with_top_k(3);
        assert_eq!(request.class_id, Some(class_id));
        assert_eq!(request.top_k, 3);
    }
}
