//! Configuration for the ingestion pipeline and query path

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding provider configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// LLM configuration for answer synthesis
    #[serde(default)]
    pub llm: LlmConfig,
    /// Vector database configuration
    #[serde(default)]
    pub vector_db: VectorDbConfig,
    /// Local storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Background processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("failed to read config file: {}", e)))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embedding dimensions must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    2500
}

fn default_chunk_overlap() -> usize {
    250
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2500,
            chunk_overlap: 250,
        }
    }
}

/// Embedding provider configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service
    pub base_url: String,
    /// API key, if the endpoint requires one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Embedding dimensions (1536 for text-embedding-ada-002)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            timeout_secs: 60,
        }
    }
}

/// LLM configuration for answer synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the chat-completions service
    pub base_url: String,
    /// API key, if the endpoint requires one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Generation model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens in the generated answer
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            max_tokens: 512,
            timeout_secs: 120,
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Qdrant base URL
    pub url: String,
    /// Collection name for document chunks
    pub collection: String,
    /// API key, if the instance requires one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "document_chunks".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let database_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("classdoc-rag")
            .join("documents.db");

        Self { database_path }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Capacity of the job queue channel
    pub queue_capacity: usize,
    /// Number of documents processed concurrently (default: CPU count, max 8)
    pub parallel_documents: Option<usize>,
    /// Hard timeout for processing a single document in seconds
    pub document_timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            parallel_documents: None,
            document_timeout_secs: 300,
        }
    }
}
