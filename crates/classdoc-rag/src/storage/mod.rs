//! Persistent storage for documents and chunk rows

mod database;
mod document_store;

pub use database::SqliteDocumentStore;
pub use document_store::DocumentStore;
