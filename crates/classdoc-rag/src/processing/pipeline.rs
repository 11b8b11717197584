//! The document processing pipeline: download, extract, chunk, embed, store

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::{TextChunker, TextExtractor};
use crate::processing::{ProcessingStage, ProgressTracker};
use crate::providers::{EmbeddingProvider, ObjectStore, VectorPoint, VectorStoreProvider};
use crate::storage::DocumentStore;
use crate::types::{ChunkMeta, DocumentStatus, Page};

/// Counters from one pipeline run
#[derive(Debug, Clone, Copy)]
pub struct PipelineReport {
    pub document_id: Uuid,
    pub pages_extracted: usize,
    pub pages_skipped: usize,
    pub chunks_created: usize,
    pub vectors_stored: usize,
}

/// Runs a registered document through download, extraction, chunking,
/// embedding, and storage.
///
/// Collaborators are injected behind traits so tests can swap in fakes.
pub struct DocumentPipeline {
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStoreProvider>,
    chunker: TextChunker,
    progress: Arc<ProgressTracker>,
}

impl DocumentPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        vectors: Arc<dyn VectorStoreProvider>,
        chunker: TextChunker,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            store,
            objects,
            extractor,
            embedder,
            vectors,
            chunker,
            progress,
        }
    }

    /// Process one document end to end.
    ///
    /// On failure the document is marked `Failed` in the store on a
    /// best-effort basis and the original error is returned.
    pub async fn process(&self, document_id: Uuid) -> Result<PipelineReport> {
        match self.run(document_id).await {
            Ok(report) => {
                self.progress.update(document_id, ProcessingStage::Complete);
                tracing::info!(
                    document_id = %document_id,
                    pages = report.pages_extracted,
                    chunks = report.chunks_created,
                    "document processed"
                );
                Ok(report)
            }
            Err(e) => {
                self.progress.fail(document_id, &e);
                tracing::error!(document_id = %document_id, kind = e.kind(), "processing failed: {}", e);
                // Vector store errors only happen after the chunk rows are
                // committed and the document marked processed; that status
                // stays, the text is durable and queryable from SQL.
                if !matches!(e, Error::VectorStore(_)) {
                    if let Err(status_err) =
                        self.store.set_status(&document_id, DocumentStatus::Failed)
                    {
                        tracing::warn!(
                            document_id = %document_id,
                            "could not mark document as failed: {}",
                            status_err
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn run(&self, document_id: Uuid) -> Result<PipelineReport> {
        let document = self
            .store
            .get_document(&document_id)?
            .ok_or(Error::DocumentNotFound(document_id))?;

        self.store
            .set_status(&document_id, DocumentStatus::Processing)?;

        self.progress
            .update(document_id, ProcessingStage::Downloading);
        let data = self.objects.fetch(&document.source_url).await?;

        self.progress
            .update(document_id, ProcessingStage::Extracting);
        let pages = self.extractor.extract(&document.filename, &data)?;
        // Enforced here so every extractor implementation gets the same
        // taxonomy: a document with no usable text fails at extraction.
        if pages.iter().all(Page::is_blank) {
            return Err(Error::Extraction(
                "document contains no extractable text".into(),
            ));
        }
        let pages_extracted = pages.len();

        self.progress.update(document_id, ProcessingStage::Chunking);
        let mut contents: Vec<String> = Vec::new();
        let mut metas: Vec<ChunkMeta> = Vec::new();
        let mut pages_skipped = 0usize;

        for page in &pages {
            if page.is_blank() {
                pages_skipped += 1;
                continue;
            }
            for chunk in self.chunker.chunk(&page.text) {
                contents.push(chunk);
                metas.push(ChunkMeta {
                    user_id: document.user_id,
                    class_id: document.class_id,
                    document_id: document.id,
                    page_number: page.page_number,
                });
            }
        }

        if contents.is_empty() {
            return Err(Error::NoChunks);
        }

        self.progress
            .update(document_id, ProcessingStage::Embedding);
        let embeddings = self.embedder.embed_batch(&contents).await?;
        if embeddings.len() != contents.len() {
            return Err(Error::EmbeddingCountMismatch {
                expected: contents.len(),
                actual: embeddings.len(),
            });
        }

        self.progress
            .update(document_id, ProcessingStage::StoringDb);
        self.store.replace_chunks(&document_id, &contents)?;
        // The document counts as processed once its text is durable; vector
        // upsert failure after this point leaves search degraded, not the
        // document lost.
        self.store
            .set_status(&document_id, DocumentStatus::Processed)?;

        self.progress
            .update(document_id, ProcessingStage::StoringVectors);
        self.vectors
            .ensure_collection(self.embedder.dimensions())
            .await?;

        let points: Vec<VectorPoint> = contents
            .iter()
            .zip(embeddings)
            .zip(metas)
            .enumerate()
            .map(|(index, ((content, vector), meta))| VectorPoint {
                id: Uuid::new_v4(),
                vector,
                content: content.clone(),
                meta,
                chunk_index: index as u32,
            })
            .collect();
        let vectors_stored = points.len();
        self.vectors.upsert(&points).await?;

        Ok(PipelineReport {
            document_id,
            pages_extracted,
            pages_skipped,
            chunks_created: contents.len(),
            vectors_stored,
        })
    }

    /// Remove a document everywhere: chunk vectors, chunk rows, and the
    /// document record itself. Returns whether the document existed.
    pub async fn delete_document(&self, document_id: Uuid) -> Result<bool> {
        let removed_points = self.vectors.delete_by_document(&document_id).await?;
        let existed = self.store.delete_document(&document_id)?;
        self.progress.clear(&document_id);
        tracing::info!(
            document_id = %document_id,
            vectors = removed_points,
            existed,
            "deleted document"
        );
        Ok(existed)
    }
}
