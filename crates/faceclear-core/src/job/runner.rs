//! Task execution: synchronous and deferred pipeline runs.
//!
//! The runner is the only place pipeline failures turn into job state.
//! It claims a job, runs the CPU-bound pipeline on a blocking thread,
//! and records the outcome. The deferred path re-attempts failed runs up
//! to a fixed bound with a fixed backoff delay; each attempt re-runs the
//! full pipeline from scratch.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::error::{FaceclearError, JobError, PipelineError};
use crate::pipeline::{AnalysisPipeline, AnalyzeOptions, SharpnessScorer};
use crate::types::AnalysisResult;

use super::{JobId, JobStore};

/// Retry bounds for deferred execution.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts (first run included)
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from runner configuration.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Handle to a deferred pipeline run.
///
/// Dropping the handle does not cancel the run; callers observe progress
/// by polling job state through the store.
pub struct TaskHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl TaskHandle {
    /// Wait for the worker to finish. Used by tests and shutdown paths;
    /// normal callers poll the job store instead.
    pub async fn wait(self) {
        let _ = self.handle.await;
    }
}

/// Executes pipeline runs against jobs held in a store.
#[derive(Clone)]
pub struct TaskRunner {
    store: Arc<dyn JobStore>,
    pipeline: Arc<AnalysisPipeline>,
}

impl TaskRunner {
    pub fn new(store: Arc<dyn JobStore>, pipeline: Arc<AnalysisPipeline>) -> Self {
        Self { store, pipeline }
    }

    /// Run a job to completion on the caller's behalf.
    ///
    /// The caller blocks until the pipeline finishes and receives the
    /// result or the failure directly; the job record ends Completed or
    /// Failed accordingly. Bad options are rejected before the job is
    /// touched.
    pub async fn run_sync(
        &self,
        id: JobId,
        options: AnalyzeOptions,
    ) -> Result<AnalysisResult, FaceclearError> {
        SharpnessScorer::new(options.threshold)?;
        match self.attempt(id, options, true).await? {
            Ok(result) => Ok(result),
            Err(e) => Err(e.into()),
        }
    }

    /// Defer a job to a background worker with bounded retry.
    ///
    /// Returns immediately with a handle; the caller polls job state.
    /// Bad options are rejected here, before any job-state mutation.
    pub fn submit_async(
        &self,
        id: JobId,
        options: AnalyzeOptions,
        policy: RetryPolicy,
    ) -> Result<TaskHandle, PipelineError> {
        SharpnessScorer::new(options.threshold)?;
        let runner = self.clone();
        let handle = tokio::spawn(async move {
            runner.run_with_retry(id, options, policy).await;
        });
        Ok(TaskHandle { handle })
    }

    async fn run_with_retry(&self, id: JobId, options: AnalyzeOptions, policy: RetryPolicy) {
        for attempt in 1..=policy.max_attempts {
            let last = attempt == policy.max_attempts;
            match self.attempt(id, options, last).await {
                Ok(Ok(result)) => {
                    tracing::info!(
                        "Job {id} completed on attempt {attempt}: {} face(s), {} blurred",
                        result.total_faces,
                        result.blurred_faces
                    );
                    return;
                }
                Ok(Err(e)) => {
                    if last {
                        tracing::error!(
                            "Job {id} failed after {attempt} attempt(s), giving up: {e}"
                        );
                        return;
                    }
                    tracing::warn!(
                        "Job {id} attempt {attempt}/{} failed: {e}; retrying in {:?}",
                        policy.max_attempts,
                        policy.delay
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                Err(e) => {
                    // Claim conflicts and missing jobs are not retryable
                    tracing::error!("Job {id} could not be processed: {e}");
                    return;
                }
            }
        }
    }

    /// One claim-run-record cycle.
    ///
    /// On pipeline failure the job is terminally failed when `last`,
    /// otherwise reset to pending for the next claim.
    async fn attempt(
        &self,
        id: JobId,
        options: AnalyzeOptions,
        last: bool,
    ) -> Result<Result<AnalysisResult, PipelineError>, JobError> {
        let mut job = self.store.claim(id).await?;
        tracing::debug!("Claimed job {id}");

        let pipeline = Arc::clone(&self.pipeline);
        let image = job.source_image().clone();
        let outcome = tokio::task::spawn_blocking(move || pipeline.run(&image, &options))
            .await
            .unwrap_or_else(|e| {
                Err(PipelineError::Internal {
                    message: format!("pipeline task panicked: {e}"),
                })
            });

        match outcome {
            Ok(output) => {
                let result = output.result.clone();
                job.complete(output.result, output.enhanced)?;
                self.store.update(job).await?;
                Ok(Ok(result))
            }
            Err(e) => {
                let message = e.to_string();
                if last {
                    job.fail(message)?;
                } else {
                    job.reset_for_retry(message)?;
                }
                self.store.update(job).await?;
                Ok(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::PipelineError;
    use crate::job::{JobStatus, MemoryJobStore};
    use crate::pipeline::locate::FaceLocator;
    use crate::raster::RasterImage;
    use crate::types::{BoundingBox, FaceRegion};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Locator that fails its first `failures` calls, then reports one
    /// fixed face region.
    struct FlakyLocator {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyLocator {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FaceLocator for FlakyLocator {
        fn locate(&self, image: &RasterImage) -> Result<Vec<FaceRegion>, PipelineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(PipelineError::Detect {
                    message: format!("induced failure on call {call}"),
                });
            }
            Ok(vec![FaceRegion::new(
                1,
                BoundingBox::new(10, 10, 50, 50),
                0.9,
                image.width(),
                image.height(),
            )?])
        }
    }

    fn image() -> RasterImage {
        RasterImage::from_fn(100, 100, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 {
                [255, 255, 255]
            } else {
                [0, 0, 0]
            }
        })
    }

    fn runner_with(locator: Arc<dyn FaceLocator>) -> (TaskRunner, Arc<MemoryJobStore>) {
        let store = Arc::new(MemoryJobStore::new());
        let pipeline =
            Arc::new(AnalysisPipeline::new(locator, &Config::default()).unwrap());
        (TaskRunner::new(store.clone(), pipeline), store)
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_run_sync_completes_job() {
        let (runner, store) = runner_with(Arc::new(FlakyLocator::new(0)));
        let id = store.create(image()).await.unwrap();

        let result = runner.run_sync(id, AnalyzeOptions::default()).await.unwrap();
        assert_eq!(result.total_faces, 1);

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.processed_at().is_some());
        assert!(job.result_image().is_some());
    }

    #[tokio::test]
    async fn test_run_sync_failure_marks_job_failed() {
        let (runner, store) = runner_with(Arc::new(FlakyLocator::new(u32::MAX)));
        let id = store.create(image()).await.unwrap();

        let err = runner.run_sync(id, AnalyzeOptions::default()).await.unwrap_err();
        assert!(matches!(err, FaceclearError::Pipeline(_)));

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error().is_some_and(|e| !e.is_empty()));
        assert!(job.result().is_none());
    }

    #[tokio::test]
    async fn test_run_sync_rejects_bad_threshold_without_touching_job() {
        let (runner, store) = runner_with(Arc::new(FlakyLocator::new(0)));
        let id = store.create(image()).await.unwrap();

        let options = AnalyzeOptions {
            threshold: -3.0,
            ..AnalyzeOptions::default()
        };
        let err = runner.run_sync(id, options).await.unwrap_err();
        assert!(matches!(
            err,
            FaceclearError::Pipeline(PipelineError::InvalidParameter { .. })
        ));
        assert_eq!(store.get(id).await.unwrap().status(), JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_run_sync_on_claimed_job_conflicts() {
        let (runner, store) = runner_with(Arc::new(FlakyLocator::new(0)));
        let id = store.create(image()).await.unwrap();
        store.claim(id).await.unwrap();

        let err = runner.run_sync(id, AnalyzeOptions::default()).await.unwrap_err();
        assert!(matches!(err, FaceclearError::Job(JobError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_async_retry_reruns_detection_from_scratch() {
        let locator = Arc::new(FlakyLocator::new(2));
        let (runner, store) = runner_with(locator.clone());
        let id = store.create(image()).await.unwrap();

        let handle = runner
            .submit_async(id, AnalyzeOptions::default(), fast_policy(3))
            .unwrap();
        handle.wait().await;

        // Detection ran once per attempt: two failures, then success
        assert_eq!(locator.call_count(), 3);
        let job = store.get(id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result().unwrap().total_faces, 1);
    }

    #[tokio::test]
    async fn test_async_exhausted_retries_leave_job_failed() {
        let locator = Arc::new(FlakyLocator::new(u32::MAX));
        let (runner, store) = runner_with(locator.clone());
        let id = store.create(image()).await.unwrap();

        let handle = runner
            .submit_async(id, AnalyzeOptions::default(), fast_policy(3))
            .unwrap();
        handle.wait().await;

        assert_eq!(locator.call_count(), 3);
        let job = store.get(id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error().is_some_and(|e| e.contains("induced failure")));
    }

    #[tokio::test]
    async fn test_submit_async_rejects_bad_threshold() {
        let (runner, store) = runner_with(Arc::new(FlakyLocator::new(0)));
        let id = store.create(image()).await.unwrap();

        let options = AnalyzeOptions {
            threshold: f64::NEG_INFINITY,
            ..AnalyzeOptions::default()
        };
        assert!(runner.submit_async(id, options, fast_policy(3)).is_err());
        assert_eq!(store.get(id).await.unwrap().status(), JobStatus::Pending);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RetryPolicy::from_config(&RunnerConfig::default());
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(60));
    }
}
