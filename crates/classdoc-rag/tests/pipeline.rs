//! End-to-end pipeline and query tests with in-memory backends

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use classdoc_rag::error::{Error, Result};
use classdoc_rag::ingestion::{TextChunker, TextExtractor};
use classdoc_rag::processing::{DocumentPipeline, ProcessingStage, ProgressTracker};
use classdoc_rag::providers::{
    EmbeddingProvider, InMemoryVectorStore, LlmProvider, ObjectStore, SearchFilter, VectorPoint,
    VectorSearchResult, VectorStoreProvider,
};
use classdoc_rag::retrieval::QueryEngine;
use classdoc_rag::storage::{DocumentStore, SqliteDocumentStore};
use classdoc_rag::types::{Document, DocumentStatus, Page, QueryRequest};

struct StaticObjectStore {
    data: Vec<u8>,
}

#[async_trait]
impl ObjectStore for StaticObjectStore {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

struct StubExtractor {
    pages: Vec<Page>,
}

impl TextExtractor for StubExtractor {
    fn extract(&self, _filename: &str, _data: &[u8]) -> Result<Vec<Page>> {
        Ok(self.pages.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Deterministic embedder: vectors derived from text length and byte sum
struct HashEmbedder;

fn vector_for(text: &str) -> Vec<f32> {
    let byte_sum: u32 = text.bytes().map(u32::from).sum();
    vec![
        1.0,
        text.len() as f32,
        (byte_sum % 997) as f32,
        (byte_sum % 31) as f32,
    ]
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vector_for(text))
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Returns one vector fewer than requested
struct ShortEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .skip(1)
            .map(|text| vector_for(text))
            .collect())
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "short"
    }
}

/// Vector store whose upsert always fails
struct FailingVectorStore;

#[async_trait]
impl VectorStoreProvider for FailingVectorStore {
    async fn ensure_collection(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _points: &[VectorPoint]) -> Result<()> {
        Err(Error::VectorStore("upsert unavailable".into()))
    }

    async fn search(
        &self,
        _query: &[f32],
        _top_k: usize,
        _filter: &SearchFilter,
    ) -> Result<Vec<VectorSearchResult>> {
        Ok(Vec::new())
    }

    async fn delete_by_document(&self, _document_id: &Uuid) -> Result<usize> {
        Ok(0)
    }

    async fn len(&self) -> Result<usize> {
        Ok(0)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Delegates to a real store but fails every chunk write
struct BrokenChunkStore {
    inner: SqliteDocumentStore,
}

impl DocumentStore for BrokenChunkStore {
    fn insert_document(&self, document: &Document) -> Result<()> {
        self.inner.insert_document(document)
    }

    fn get_document(&self, id: &Uuid) -> Result<Option<Document>> {
        self.inner.get_document(id)
    }

    fn list_by_class(&self, user_id: &Uuid, class_id: &Uuid) -> Result<Vec<Document>> {
        self.inner.list_by_class(user_id, class_id)
    }

    fn set_status(&self, id: &Uuid, status: DocumentStatus) -> Result<()> {
        self.inner.set_status(id, status)
    }

    fn delete_document(&self, id: &Uuid) -> Result<bool> {
        self.inner.delete_document(id)
    }

    fn replace_chunks(&self, _document_id: &Uuid, _contents: &[String]) -> Result<()> {
        Err(Error::Persistence("chunk write rejected".into()))
    }

    fn chunks_for_document(
        &self,
        document_id: &Uuid,
    ) -> Result<Vec<classdoc_rag::types::StoredChunk>> {
        self.inner.chunks_for_document(document_id)
    }

    fn chunk_count(&self, document_id: &Uuid) -> Result<usize> {
        self.inner.chunk_count(document_id)
    }
}

struct CannedLlm {
    answer: String,
    last_prompt: Mutex<Option<String>>,
}

impl CannedLlm {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            last_prompt: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LlmProvider for CannedLlm {
    async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        *self.last_prompt.lock() = Some(user_prompt.to_string());
        Ok(self.answer.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned-1"
    }
}

struct Harness {
    store: Arc<SqliteDocumentStore>,
    vectors: Arc<InMemoryVectorStore>,
    progress: Arc<ProgressTracker>,
    pipeline: DocumentPipeline,
}

fn harness_with(
    pages: Vec<Page>,
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStoreProvider>,
) -> (Arc<SqliteDocumentStore>, Arc<ProgressTracker>, DocumentPipeline) {
    let store = Arc::new(SqliteDocumentStore::in_memory().unwrap());
    let progress = Arc::new(ProgressTracker::new());
    let pipeline = DocumentPipeline::new(
        store.clone(),
        Arc::new(StaticObjectStore { data: b"raw".to_vec() }),
        Arc::new(StubExtractor { pages }),
        embedder,
        vectors,
        TextChunker::new(2500, 250),
        progress.clone(),
    );
    (store, progress, pipeline)
}

fn harness(pages: Vec<Page>) -> Harness {
    let vectors = Arc::new(InMemoryVectorStore::new());
    let (store, progress, pipeline) =
        harness_with(pages, Arc::new(HashEmbedder), vectors.clone());
    Harness {
        store,
        vectors,
        progress,
        pipeline,
    }
}

fn register_document(store: &SqliteDocumentStore) -> Document {
    let document = Document::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "lecture.pdf",
        "https://bucket.s3.us-east-1.amazonaws.com/lecture.pdf",
    );
    store.insert_document(&document).unwrap();
    document
}

#[tokio::test]
async fn test_happy_path_stores_chunks_and_vectors() {
    let h = harness(vec![
        Page::new(1, "Recursion is a function calling itself."),
        Page::new(2, "   \n "),
        Page::new(3, "Base cases stop the recursion."),
    ]);
    let document = register_document(&h.store);

    let report = h.pipeline.process(document.id).await.unwrap();
    assert_eq!(report.pages_extracted, 3);
    assert_eq!(report.pages_skipped, 1);
    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.vectors_stored, 2);

    let stored = h.store.get_document(&document.id).unwrap().unwrap();
    assert_eq!(stored.status, DocumentStatus::Processed);

    let chunks = h.store.chunks_for_document(&document.id).unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].chunk_index, 0);
    assert!(chunks[0].content.contains("Recursion"));
    assert!(chunks[1].content.contains("Base cases"));

    assert_eq!(h.vectors.len().await.unwrap(), 2);

    let progress = h.progress.get(&document.id).unwrap();
    assert_eq!(progress.stage, ProcessingStage::Complete);
    assert_eq!(progress.percent, 100);
}

#[tokio::test]
async fn test_all_blank_pages_is_an_extraction_error() {
    // The whitespace-only check must hold for any extractor implementation,
    // so it is exercised through a stub that performs no checks of its own.
    let h = harness(vec![Page::new(1, "  "), Page::new(2, "\n\t")]);
    let document = register_document(&h.store);

    let err = h.pipeline.process(document.id).await.unwrap_err();
    assert!(matches!(err, Error::Extraction(_)));

    let stored = h.store.get_document(&document.id).unwrap().unwrap();
    assert_eq!(stored.status, DocumentStatus::Failed);

    let progress = h.progress.get(&document.id).unwrap();
    assert_eq!(progress.stage, ProcessingStage::Failed);
    assert!(progress.error.is_some());
}

#[tokio::test]
async fn test_embedding_count_mismatch_marks_failed() {
    let vectors = Arc::new(InMemoryVectorStore::new());
    let (store, _progress, pipeline) = harness_with(
        vec![Page::new(1, "First page."), Page::new(2, "Second page.")],
        Arc::new(ShortEmbedder),
        vectors.clone(),
    );
    let document = register_document(&store);

    let err = pipeline.process(document.id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::EmbeddingCountMismatch {
            expected: 2,
            actual: 1
        }
    ));

    let stored = store.get_document(&document.id).unwrap().unwrap();
    assert_eq!(stored.status, DocumentStatus::Failed);
    // Nothing was persisted for the failed run.
    assert_eq!(store.chunk_count(&document.id).unwrap(), 0);
    assert_eq!(vectors.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_chunk_write_failure_fails_the_document() {
    let store = Arc::new(BrokenChunkStore {
        inner: SqliteDocumentStore::in_memory().unwrap(),
    });
    let vectors = Arc::new(InMemoryVectorStore::new());
    let progress = Arc::new(ProgressTracker::new());
    let pipeline = DocumentPipeline::new(
        store.clone(),
        Arc::new(StaticObjectStore { data: b"raw".to_vec() }),
        Arc::new(StubExtractor {
            pages: vec![Page::new(1, "Text that never reaches the database.")],
        }),
        Arc::new(HashEmbedder),
        vectors.clone(),
        TextChunker::new(2500, 250),
        progress.clone(),
    );

    let document = Document::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "lecture.pdf",
        "https://bucket.s3.us-east-1.amazonaws.com/lecture.pdf",
    );
    store.insert_document(&document).unwrap();

    let err = pipeline.process(document.id).await.unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));

    let stored = store.get_document(&document.id).unwrap().unwrap();
    assert_eq!(stored.status, DocumentStatus::Failed);
    assert_eq!(store.chunk_count(&document.id).unwrap(), 0);
    // The vector upsert never ran.
    assert_eq!(vectors.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_vector_store_failure_after_commit_keeps_processed_status() {
    let (store, progress, pipeline) = harness_with(
        vec![Page::new(1, "Durable text.")],
        Arc::new(HashEmbedder),
        Arc::new(FailingVectorStore),
    );
    let document = register_document(&store);

    let err = pipeline.process(document.id).await.unwrap_err();
    assert!(matches!(err, Error::VectorStore(_)));

    // Chunk rows were committed and the status written before the vector
    // upsert; a vector store failure leaves the document processed.
    let stored = store.get_document(&document.id).unwrap().unwrap();
    assert_eq!(stored.status, DocumentStatus::Processed);
    assert_eq!(store.chunk_count(&document.id).unwrap(), 1);

    let snapshot = progress.get(&document.id).unwrap();
    assert_eq!(snapshot.stage, ProcessingStage::Failed);
}

#[tokio::test]
async fn test_unknown_document_is_reported() {
    let h = harness(vec![Page::new(1, "text")]);
    let missing = Uuid::new_v4();

    let err = h.pipeline.process(missing).await.unwrap_err();
    assert!(matches!(err, Error::DocumentNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_reprocessing_replaces_chunks_instead_of_accumulating() {
    let h = harness(vec![Page::new(1, "Stable content.")]);
    let document = register_document(&h.store);

    h.pipeline.process(document.id).await.unwrap();
    h.pipeline.process(document.id).await.unwrap();

    assert_eq!(h.store.chunk_count(&document.id).unwrap(), 1);
}

#[tokio::test]
async fn test_delete_document_removes_rows_and_vectors() {
    let h = harness(vec![Page::new(1, "To be deleted.")]);
    let document = register_document(&h.store);
    h.pipeline.process(document.id).await.unwrap();

    let existed = h.pipeline.delete_document(document.id).await.unwrap();
    assert!(existed);
    assert!(h.store.get_document(&document.id).unwrap().is_none());
    assert_eq!(h.store.chunk_count(&document.id).unwrap(), 0);
    assert_eq!(h.vectors.len().await.unwrap(), 0);
    assert!(h.progress.get(&document.id).is_none());

    let again = h.pipeline.delete_document(document.id).await.unwrap();
    assert!(!again);
}

#[tokio::test]
async fn test_query_answers_from_retrieved_chunks() {
    let h = harness(vec![Page::new(
        1,
        "Recursion is a function calling itself until a base case stops it.",
    )]);
    let document = register_document(&h.store);
    h.pipeline.process(document.id).await.unwrap();

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder);
    let llm = Arc::new(CannedLlm::new("Recursion is a function calling itself."));
    let engine = QueryEngine::new(embedder, h.vectors.clone(), llm.clone());

    let request = QueryRequest::new("What is recursion?", document.user_id)
        .with_class(document.class_id)
        .with_top_k(3);
    let response = engine.answer(&request).await.unwrap();

    assert_eq!(response.answer, "Recursion is a function calling itself.");
    assert_eq!(response.chunks_retrieved, 1);
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].document_id, document.id);
    assert_eq!(response.sources[0].page_number, 1);

    let prompt = llm.last_prompt.lock().clone().unwrap();
    assert!(prompt.contains("Use ONLY the following context"));
    assert!(prompt.contains("Chunk 1:"));
    assert!(prompt.contains("What is recursion?"));
}

#[tokio::test]
async fn test_query_never_crosses_user_boundaries() {
    let h = harness(vec![Page::new(1, "Private course notes.")]);
    let document = register_document(&h.store);
    h.pipeline.process(document.id).await.unwrap();

    let llm = Arc::new(CannedLlm::new("should never be called"));
    let engine = QueryEngine::new(Arc::new(HashEmbedder), h.vectors.clone(), llm.clone());

    let stranger = Uuid::new_v4();
    let response = engine
        .answer(&QueryRequest::new("What do the notes say?", stranger))
        .await
        .unwrap();

    assert_eq!(response.chunks_retrieved, 0);
    assert!(response.sources.is_empty());
    assert!(response.answer.contains("couldn't find relevant information"));
    assert!(llm.last_prompt.lock().is_none());
}
