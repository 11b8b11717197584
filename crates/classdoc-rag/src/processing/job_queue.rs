//! Job queue and per-document progress tracking

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Stage a document is in while being processed.
///
/// Progress percentages are fixed checkpoints, not interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Downloading,
    Extracting,
    Chunking,
    Embedding,
    StoringDb,
    StoringVectors,
    Complete,
    Failed,
}

impl ProcessingStage {
    /// Progress checkpoint for this stage
    pub fn percent(&self) -> u8 {
        match self {
            ProcessingStage::Downloading => 0,
            ProcessingStage::Extracting => 10,
            ProcessingStage::Chunking => 30,
            ProcessingStage::Embedding => 50,
            ProcessingStage::StoringDb => 70,
            ProcessingStage::StoringVectors => 90,
            ProcessingStage::Complete => 100,
            ProcessingStage::Failed => 100,
        }
    }
}

/// Progress snapshot for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub document_id: Uuid,
    pub stage: ProcessingStage,
    pub percent: u8,
    pub error: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Shared per-document progress map, updated by pipelines, read by callers
#[derive(Default)]
pub struct ProgressTracker {
    entries: DashMap<Uuid, PipelineProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage transition
    pub fn update(&self, document_id: Uuid, stage: ProcessingStage) {
        self.entries.insert(
            document_id,
            PipelineProgress {
                document_id,
                stage,
                percent: stage.percent(),
                error: None,
                updated_at: chrono::Utc::now(),
            },
        );
    }

    /// Record a failure with its cause
    pub fn fail(&self, document_id: Uuid, error: &Error) {
        self.entries.insert(
            document_id,
            PipelineProgress {
                document_id,
                stage: ProcessingStage::Failed,
                percent: ProcessingStage::Failed.percent(),
                error: Some(error.to_string()),
                updated_at: chrono::Utc::now(),
            },
        );
    }

    /// Current progress for a document, if any pipeline has touched it
    pub fn get(&self, document_id: &Uuid) -> Option<PipelineProgress> {
        self.entries.get(document_id).map(|entry| entry.clone())
    }

    /// Drop the progress entry for a document
    pub fn clear(&self, document_id: &Uuid) {
        self.entries.remove(document_id);
    }
}

/// A processing job: one document to run through the pipeline
#[derive(Debug, Clone, Copy)]
pub struct Job {
    pub document_id: Uuid,
}

/// Bounded queue feeding the processing worker
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
    progress: Arc<ProgressTracker>,
}

impl JobQueue {
    /// Create a queue; the receiver goes to `ProcessingWorker::run`
    pub fn new(capacity: usize, progress: Arc<ProgressTracker>) -> (Self, mpsc::Receiver<Job>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, progress }, receiver)
    }

    /// Enqueue a document for processing without blocking.
    ///
    /// Fails when the queue is full or the worker is gone.
    pub fn submit(&self, document_id: Uuid) -> Result<()> {
        self.sender
            .try_send(Job { document_id })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::Persistence("job queue is full".into())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    Error::Persistence("job queue is closed".into())
                }
            })?;

        tracing::info!(document_id = %document_id, "queued document for processing");
        Ok(())
    }

    /// Progress for a queued or processed document
    pub fn progress(&self, document_id: &Uuid) -> Option<PipelineProgress> {
        self.progress.get(document_id)
    }
}
