//! Error types for the document pipeline and query path

use uuid::Uuid;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by ingestion, processing, storage, and retrieval
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fetching the source document from object storage failed
    #[error("download failed: {0}")]
    Download(String),

    /// Text extraction produced nothing usable
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// Chunking produced zero chunks for a document with extractable text
    #[error("no chunks produced for document")]
    NoChunks,

    /// The embedding provider returned a different number of vectors than
    /// chunks submitted
    #[error("embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    /// Writing to SQLite or the job queue failed
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// Embedding provider request failed
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// Vector store request failed
    #[error("vector store error: {0}")]
    VectorStore(String),

    /// LLM generation failed
    #[error("llm error: {0}")]
    Llm(String),

    /// Document row not found in the database
    #[error("document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Catch-all for unexpected internal failures
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short stable label for logs and progress reporting
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Download(_) => "download",
            Error::Extraction(_) => "extraction",
            Error::NoChunks => "no_chunks",
            Error::EmbeddingCountMismatch { .. } => "embedding_count_mismatch",
            Error::Persistence(_) => "persistence",
            Error::Embedding(_) => "embedding",
            Error::VectorStore(_) => "vector_store",
            Error::Llm(_) => "llm",
            Error::DocumentNotFound(_) => "document_not_found",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
        }
    }
}
