//! Core types for documents, chunks, and queries

pub mod document;
pub mod query;

pub use document::{ChunkMeta, Document, DocumentStatus, Page, StoredChunk};
pub use query::{ChunkSource, QueryRequest, QueryResponse};
