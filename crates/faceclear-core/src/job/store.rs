//! Job persistence behind an opaque repository interface.
//!
//! The core treats the store as a durable key-value map of job id to
//! job record. Durability is the collaborator's concern; the in-memory
//! implementation here backs tests and the CLI.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::JobError;
use crate::raster::RasterImage;

use super::{AnalysisJob, JobId, JobStatus};

/// Repository interface for analysis jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a pending job owning the given source image.
    async fn create(&self, image: RasterImage) -> Result<JobId, JobError>;

    /// Fetch a job by id.
    async fn get(&self, id: JobId) -> Result<AnalysisJob, JobError>;

    /// Persist an updated job record.
    async fn update(&self, job: AnalysisJob) -> Result<(), JobError>;

    /// Remove a job.
    async fn delete(&self, id: JobId) -> Result<(), JobError>;

    /// All jobs, newest first.
    async fn list(&self) -> Vec<AnalysisJob>;

    /// Atomically claim a pending job for processing.
    ///
    /// This is the single entry into `processing`: the compare-and-set
    /// on status guarantees no job is ever held by two workers. A job
    /// already processing yields [`JobError::Conflict`].
    async fn claim(&self, id: JobId) -> Result<AnalysisJob, JobError>;
}

/// In-memory job store keyed by job id.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, AnalysisJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, image: RasterImage) -> Result<JobId, JobError> {
        let job = AnalysisJob::new(image);
        let id = job.id();
        self.jobs.lock().await.insert(id, job);
        tracing::debug!("Created job {id}");
        Ok(id)
    }

    async fn get(&self, id: JobId) -> Result<AnalysisJob, JobError> {
        self.jobs
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(JobError::NotFound(id))
    }

    async fn update(&self, job: AnalysisJob) -> Result<(), JobError> {
        let mut jobs = self.jobs.lock().await;
        let id = job.id();
        if !jobs.contains_key(&id) {
            return Err(JobError::NotFound(id));
        }
        jobs.insert(id, job);
        Ok(())
    }

    async fn delete(&self, id: JobId) -> Result<(), JobError> {
        self.jobs
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(JobError::NotFound(id))
    }

    async fn list(&self) -> Vec<AnalysisJob> {
        let jobs = self.jobs.lock().await;
        let mut all: Vec<AnalysisJob> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        all
    }

    async fn claim(&self, id: JobId) -> Result<AnalysisJob, JobError> {
        // The whole check-and-set happens under one lock hold, so only
        // one claimer can observe the job pending.
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
        match job.status() {
            JobStatus::Processing => Err(JobError::Conflict(id)),
            _ => {
                job.begin_processing()?;
                Ok(job.clone())
            }
        }
    }
}
