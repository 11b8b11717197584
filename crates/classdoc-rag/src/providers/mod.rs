//! Provider abstractions for embeddings, LLM, vector storage, and object storage
//!
//! Everything the pipeline talks to over a network sits behind one of these
//! traits, so collaborators are injected rather than reached through globals.

pub mod embedding;
pub mod llm;
pub mod memory;
pub mod object_store;
pub mod qdrant;
pub mod vector_store;

pub use embedding::{EmbeddingProvider, OpenAiEmbedder};
pub use llm::{LlmProvider, OpenAiChat};
pub use memory::InMemoryVectorStore;
pub use object_store::{parse_s3_url, HttpObjectStore, ObjectStore, S3Location};
pub use qdrant::QdrantStore;
pub use vector_store::{SearchFilter, VectorPoint, VectorSearchResult, VectorStoreProvider};
