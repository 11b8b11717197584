//! Background document processing: pipeline, job queue, and worker

mod job_queue;
mod pipeline;
mod worker;

pub use job_queue::{Job, JobQueue, PipelineProgress, ProcessingStage, ProgressTracker};
pub use pipeline::{DocumentPipeline, PipelineReport};
pub use worker::ProcessingWorker;
