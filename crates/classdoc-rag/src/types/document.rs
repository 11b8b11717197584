//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a document, mutated only by the processing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Uploaded, not yet picked up by a worker
    Pending,
    /// A worker is processing the document
    Processing,
    /// Chunks are stored and queryable
    Processed,
    /// Processing failed; see worker logs for the cause
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Processed => "processed",
            DocumentStatus::Failed => "failed",
        }
    }
}

/// A registered document owned by a user within a class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Class the document belongs to
    pub class_id: Uuid,
    /// Original filename
    pub filename: String,
    /// Object-storage URL the raw bytes are fetched from
    pub source_url: String,
    /// Current processing status
    pub status: DocumentStatus,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// Create a new pending document
    pub fn new(
        user_id: Uuid,
        class_id: Uuid,
        filename: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            class_id,
            filename: filename.into(),
            source_url: source_url.into(),
            status: DocumentStatus::Pending,
            uploaded_at: Utc::now(),
        }
    }
}

/// One page of extracted text, 1-based page numbering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page number within the source document (first page is 1)
    pub page_number: u32,
    /// Extracted text; may be empty for pages without extractable content
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    /// True if the page holds no non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Metadata attached to every chunk, both in SQLite rows and vector payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub user_id: Uuid,
    pub class_id: Uuid,
    pub document_id: Uuid,
    /// 1-based page the chunk was cut from
    pub page_number: u32,
}

/// A chunk row persisted in SQLite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Row ID
    pub id: i64,
    /// Owning document
    pub document_id: Uuid,
    /// 0-based position within the document
    pub chunk_index: u32,
    /// Chunk text
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_pending() {
        let doc = Document::new(Uuid::new_v4(), Uuid::new_v4(), "notes.pdf", "https://x/y");
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert_eq!(doc.status.as_str(), "pending");
    }

    #[test]
    fn test_blank_page_detection() {
        assert!(Page::new(1, "  \n\t ").is_blank());
        assert!(!Page::new(2, "content").is_blank());
    }
}
