//! Query engine: embed the question, search, and generate a grounded answer

use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::generation::{PromptBuilder, SYSTEM_PROMPT};
use crate::providers::{
    EmbeddingProvider, LlmProvider, SearchFilter, VectorSearchResult, VectorStoreProvider,
};
use crate::types::{ChunkSource, QueryRequest, QueryResponse};

/// Answers questions against a user's stored documents
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    prompts: PromptBuilder,
}

impl QueryEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vectors: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            embedder,
            vectors,
            llm,
            prompts: PromptBuilder::new(),
        }
    }

    /// Retrieve the most similar chunks for a request, without generation
    pub async fn retrieve(&self, request: &QueryRequest) -> Result<Vec<VectorSearchResult>> {
        let query_vector = self.embedder.embed(&request.question).await?;
        let filter = SearchFilter {
            user_id: request.user_id,
            class_id: request.class_id,
            document_id: request.document_id,
        };
        self.vectors
            .search(&query_vector, request.top_k, &filter)
            .await
    }

    /// Answer a question using only retrieved chunk context.
    ///
    /// With no matching chunks the response is a fixed "not found" answer
    /// and the LLM is never called.
    pub async fn answer(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let started = Instant::now();

        let results = self.retrieve(request).await?;
        tracing::debug!(
            user_id = %request.user_id,
            hits = results.len(),
            top_k = request.top_k,
            "retrieved chunks for query"
        );

        if results.is_empty() {
            return Ok(QueryResponse::not_found(
                started.elapsed().as_millis() as u64
            ));
        }

        let context = self.prompts.build_context(&results);
        let prompt = self.prompts.build_prompt(&request.question, &context);
        let answer = self.llm.generate(SYSTEM_PROMPT, &prompt).await?;

        let sources = results
            .iter()
            .map(|result| ChunkSource {
                document_id: result.meta.document_id,
                chunk_index: result.chunk_index,
                page_number: result.meta.page_number,
                score: result.score,
                content: result.content.clone(),
            })
            .collect::<Vec<_>>();

        Ok(QueryResponse {
            answer,
            chunks_retrieved: results.len(),
            sources,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}
