//! Worker loop draining the job queue into pipeline runs

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

use crate::config::ProcessingConfig;
use crate::error::Error;
use crate::processing::{DocumentPipeline, Job, ProgressTracker};
use crate::storage::DocumentStore;
use crate::types::DocumentStatus;

/// Drains the job queue, running pipelines with bounded parallelism and a
/// per-document timeout
pub struct ProcessingWorker {
    pipeline: Arc<DocumentPipeline>,
    store: Arc<dyn DocumentStore>,
    progress: Arc<ProgressTracker>,
    parallelism: usize,
    document_timeout: Duration,
}

impl ProcessingWorker {
    pub fn new(
        pipeline: Arc<DocumentPipeline>,
        store: Arc<dyn DocumentStore>,
        progress: Arc<ProgressTracker>,
        config: &ProcessingConfig,
    ) -> Self {
        let parallelism = config
            .parallel_documents
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1);

        Self {
            pipeline,
            store,
            progress,
            parallelism,
            document_timeout: Duration::from_secs(config.document_timeout_secs),
        }
    }

    /// Run until the queue's senders are all dropped.
    ///
    /// Each job runs in its own task; the semaphore caps how many documents
    /// are in flight at once.
    pub async fn run(&self, mut receiver: mpsc::Receiver<Job>) {
        tracing::info!(
            parallelism = self.parallelism,
            timeout_secs = self.document_timeout.as_secs(),
            "processing worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.parallelism));

        while let Some(job) = receiver.recv().await {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                // Only happens if the semaphore is closed, which we never do.
                tracing::error!("worker semaphore closed, stopping");
                break;
            };

            let pipeline = Arc::clone(&self.pipeline);
            let store = Arc::clone(&self.store);
            let progress = Arc::clone(&self.progress);
            let timeout = self.document_timeout;

            tokio::spawn(async move {
                let _permit = permit;
                let document_id = job.document_id;

                match tokio::time::timeout(timeout, pipeline.process(document_id)).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(_)) => {
                        // process() already logged and marked the document.
                    }
                    Err(_) => {
                        let error = Error::Internal(format!(
                            "processing timed out after {}s",
                            timeout.as_secs()
                        ));
                        tracing::error!(document_id = %document_id, "{}", error);
                        progress.fail(document_id, &error);
                        if let Err(e) = store.set_status(&document_id, DocumentStatus::Failed) {
                            tracing::warn!(
                                document_id = %document_id,
                                "could not mark timed-out document as failed: {}",
                                e
                            );
                        }
                    }
                }
            });
        }

        tracing::info!("job queue closed, processing worker stopping");
    }
}
