//! Document store trait, the pipeline's persistence seam

use uuid::Uuid;

use crate::error::Result;
use crate::types::{Document, DocumentStatus, StoredChunk};

/// Trait for document and chunk persistence
///
/// Implementations:
/// - `SqliteDocumentStore`: SQLite-backed store
pub trait DocumentStore: Send + Sync {
    /// Register a new document
    fn insert_document(&self, document: &Document) -> Result<()>;

    /// Fetch a document by ID
    fn get_document(&self, id: &Uuid) -> Result<Option<Document>>;

    /// List a user's documents in one class, newest first
    fn list_by_class(&self, user_id: &Uuid, class_id: &Uuid) -> Result<Vec<Document>>;

    /// Update a document's processing status
    fn set_status(&self, id: &Uuid, status: DocumentStatus) -> Result<()>;

    /// Delete a document and its chunk rows, returning whether it existed
    fn delete_document(&self, id: &Uuid) -> Result<bool>;

    /// Replace a document's chunk rows with `contents`, atomically.
    ///
    /// Chunk indexes are assigned 0-based from the slice order. Any prior
    /// rows for the document are removed in the same transaction, so a
    /// partial write never survives and re-runs do not accumulate duplicates.
    fn replace_chunks(&self, document_id: &Uuid, contents: &[String]) -> Result<()>;

    /// Fetch a document's chunk rows ordered by chunk_index
    fn chunks_for_document(&self, document_id: &Uuid) -> Result<Vec<StoredChunk>>;

    /// Number of chunk rows stored for a document
    fn chunk_count(&self, document_id: &Uuid) -> Result<usize>;
}
