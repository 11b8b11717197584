//! Qdrant vector store over its REST API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::ChunkMeta;

use super::vector_store::{SearchFilter, VectorPoint, VectorSearchResult, VectorStoreProvider};

/// Qdrant-backed vector store
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CountEnvelope {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

impl QdrantStore {
    /// Create a store from configuration
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::VectorStore(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        request
    }

    async fn check(&self, response: reqwest::Response, op: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        Err(Error::VectorStore(format!(
            "{} failed with {}: {}",
            op, status, detail
        )))
    }

    fn filter_clauses(filter: &SearchFilter) -> Vec<serde_json::Value> {
        let mut must = vec![json!({
            "key": "user_id",
            "match": { "value": filter.user_id.to_string() }
        })];
        if let Some(class_id) = filter.class_id {
            must.push(json!({
                "key": "class_id",
                "match": { "value": class_id.to_string() }
            }));
        } else if let Some(document_id) = filter.document_id {
            must.push(json!({
                "key": "document_id",
                "match": { "value": document_id.to_string() }
            }));
        }
        must
    }

    fn document_filter(document_id: &Uuid) -> serde_json::Value {
        json!({
            "must": [{
                "key": "document_id",
                "match": { "value": document_id.to_string() }
            }]
        })
    }

    fn count_body(filter: Option<&serde_json::Value>) -> serde_json::Value {
        match filter {
            Some(filter) => json!({ "exact": true, "filter": filter }),
            None => json!({ "exact": true }),
        }
    }

    async fn count(&self, filter: Option<&serde_json::Value>) -> Result<usize> {
        let path = format!("/collections/{}/points/count", self.collection);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&Self::count_body(filter))
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("count failed: {}", e)))?;
        let response = self.check(response, "count").await?;

        let envelope: CountEnvelope = response
            .json()
            .await
            .map_err(|e| Error::VectorStore(format!("invalid count response: {}", e)))?;
        Ok(envelope.result.count)
    }

    fn payload_to_result(payload: serde_json::Value, score: f32) -> Option<VectorSearchResult> {
        let get_uuid = |key: &str| {
            payload
                .get(key)
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok())
        };

        let meta = ChunkMeta {
            user_id: get_uuid("user_id")?,
            class_id: get_uuid("class_id")?,
            document_id: get_uuid("document_id")?,
            page_number: payload.get("page_number").and_then(|v| v.as_u64())? as u32,
        };

        Some(VectorSearchResult {
            content: payload
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            meta,
            chunk_index: payload
                .get("chunk_index")
                .and_then(|v| v.as_u64())
                .unwrap_or_default() as u32,
            score,
        })
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantStore {
    async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        let path = format!("/collections/{}", self.collection);

        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("collection check failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        tracing::info!(collection = %self.collection, dimensions, "creating vector collection");
        let body = json!({
            "vectors": { "size": dimensions, "distance": "Cosine" }
        });
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("collection create failed: {}", e)))?;
        self.check(response, "collection create").await?;
        Ok(())
    }

    async fn upsert(&self, points: &[VectorPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let body_points: Vec<serde_json::Value> = points
            .iter()
            .map(|point| {
                json!({
                    "id": point.id.to_string(),
                    "vector": point.vector,
                    "payload": {
                        "content": point.content,
                        "chunk_index": point.chunk_index,
                        "user_id": point.meta.user_id.to_string(),
                        "class_id": point.meta.class_id.to_string(),
                        "document_id": point.meta.document_id.to_string(),
                        "page_number": point.meta.page_number,
                    }
                })
            })
            .collect();

        let path = format!("/collections/{}/points?wait=true", self.collection);
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&json!({ "points": body_points }))
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("upsert failed: {}", e)))?;
        self.check(response, "upsert").await?;

        tracing::debug!(points = points.len(), collection = %self.collection, "upserted points");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<VectorSearchResult>> {
        let body = json!({
            "vector": query,
            "limit": top_k,
            "with_payload": true,
            "filter": { "must": Self::filter_clauses(filter) },
        });

        let path = format!("/collections/{}/points/search", self.collection);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("search failed: {}", e)))?;
        let response = self.check(response, "search").await?;

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| Error::VectorStore(format!("invalid search response: {}", e)))?;

        let results = envelope
            .result
            .into_iter()
            .filter_map(|hit| {
                let payload = hit.payload?;
                Self::payload_to_result(payload, hit.score)
            })
            .collect();

        Ok(results)
    }

    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize> {
        let filter = Self::document_filter(document_id);

        // Exact count scoped to the document, so concurrent writes to other
        // documents cannot skew the reported number.
        let removed = self.count(Some(&filter)).await?;

        let path = format!("/collections/{}/points/delete?wait=true", self.collection);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&json!({ "filter": filter }))
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("delete failed: {}", e)))?;
        self.check(response, "delete").await?;

        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        self.count(None).await
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self.request(reqwest::Method::GET, "/readyz").send().await;
        match response {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
