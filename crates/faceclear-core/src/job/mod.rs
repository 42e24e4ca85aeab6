//! Analysis job lifecycle.
//!
//! An [`AnalysisJob`] tracks one submitted image from `pending` through a
//! terminal `completed` or `failed`. Transitions go through methods that
//! enforce the state machine; the pipeline itself never touches job
//! state.

pub mod runner;
pub mod store;

pub use runner::{RetryPolicy, TaskHandle, TaskRunner};
pub use store::{JobStore, MemoryJobStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JobError;
use crate::raster::RasterImage;
use crate::types::{AnalysisResult, ScoredFace};

/// Opaque unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One submitted image's analysis lifecycle record.
///
/// Owned by a [`JobStore`]; mutated only by the task runner through the
/// transition methods below.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    id: JobId,
    status: JobStatus,
    source_image: RasterImage,
    result_image: Option<RasterImage>,
    result: Option<AnalysisResult>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl AnalysisJob {
    /// Create a pending job for a decoded source image.
    pub fn new(source_image: RasterImage) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            source_image,
            result_image: None,
            result: None,
            error: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn source_image(&self) -> &RasterImage {
        &self.source_image
    }

    pub fn result_image(&self) -> Option<&RasterImage> {
        self.result_image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    /// True if any analyzed face was flagged blurred.
    pub fn has_blurred_faces(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.blurred_faces > 0)
    }

    /// Share of blurred faces, 0-100. Zero when nothing was analyzed.
    pub fn blur_percentage(&self) -> f64 {
        self.result.as_ref().map_or(0.0, |r| r.blur_percentage)
    }

    /// `pending -> processing`. Called only through [`JobStore::claim`],
    /// which makes the transition atomic per job.
    pub fn begin_processing(&mut self) -> Result<(), JobError> {
        self.guard(JobStatus::Pending, JobStatus::Processing)?;
        self.status = JobStatus::Processing;
        Ok(())
    }

    /// `processing -> completed`: attach the result and stamp the time.
    pub fn complete(
        &mut self,
        result: AnalysisResult,
        result_image: Option<RasterImage>,
    ) -> Result<(), JobError> {
        self.guard(JobStatus::Processing, JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.result_image = result_image;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// `processing -> failed`: record the error, leave result fields at
    /// their prior state. Terminal.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        self.guard(JobStatus::Processing, JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        Ok(())
    }

    /// `processing -> pending`: record the attempt's error and make the
    /// job claimable again. Used only by the runner's retry loop, so a
    /// job is terminally failed only once retries are exhausted.
    pub fn reset_for_retry(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        self.guard(JobStatus::Processing, JobStatus::Pending)?;
        self.status = JobStatus::Pending;
        self.error = Some(error.into());
        Ok(())
    }

    fn guard(&self, from: JobStatus, to: JobStatus) -> Result<(), JobError> {
        if self.status != from {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    /// Project the job onto the result surface consumed by callers.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            status: self.status,
            total_faces: self.result.as_ref().map_or(0, |r| r.total_faces),
            blurred_faces: self.result.as_ref().map_or(0, |r| r.blurred_faces),
            blur_percentage: self.blur_percentage(),
            faces: self
                .result
                .as_ref()
                .map(|r| r.faces.clone())
                .unwrap_or_default(),
            has_result_image: self.result_image.is_some(),
            created_at: self.created_at,
            processed_at: self.processed_at,
            error: self.error.clone(),
        }
    }
}

/// Per-job summary for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub status: JobStatus,
    pub total_faces: usize,
    pub blurred_faces: usize,
    pub blur_percentage: f64,
    pub faces: Vec<ScoredFace>,
    pub has_result_image: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
