//! classdoc-rag: document ingestion and question answering for course materials
//!
//! Documents are pulled from object storage, extracted page by page, split into
//! sentence-aware overlapping chunks, embedded, and stored both as SQLite rows
//! and as vector points with per-chunk metadata. The query side runs a filtered
//! similarity search scoped to the requesting user and synthesizes an answer
//! with an LLM over the retrieved chunks.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use processing::{DocumentPipeline, JobQueue, ProcessingWorker};
pub use retrieval::QueryEngine;
pub use types::{
    document::{ChunkMeta, Document, DocumentStatus, Page},
    query::{QueryRequest, QueryResponse},
};

/// Initialize tracing with an env-filter (RUST_LOG), defaulting to info.
///
/// Call once at startup; repeated calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,classdoc_rag=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
