//! faceclear core - face-region analysis and restoration pipeline.
//!
//! faceclear ingests a photograph, locates human faces, scores each face
//! region for optical sharpness, optionally restores blurred regions,
//! and produces an annotated result plus structured per-face statistics.
//!
//! # Architecture
//!
//! ```text
//! bytes -> validate -> decode -> locate -> score -> [restore -> annotate] -> result
//!                                   job: pending -> processing -> completed | failed
//! ```
//!
//! The pipeline is pure: it propagates every failure to the task runner,
//! which is the only component that converts failures into job state.
//! Persistence sits behind the [`job::JobStore`] trait; execution is
//! either synchronous or deferred with bounded retry via
//! [`job::TaskRunner`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use faceclear_core::{AnalysisPipeline, AnalyzeOptions, Config, RustfaceLocator};
//! use faceclear_core::job::{MemoryJobStore, JobStore, TaskRunner};
//!
//! #[tokio::main]
//! async fn main() -> faceclear_core::Result<()> {
//!     let config = Config::load()?;
//!     let locator = RustfaceLocator::from_file(&config.model_path(), config.detector.clone())?;
//!     let pipeline = Arc::new(AnalysisPipeline::new(Arc::new(locator), &config)?);
//!     let store = Arc::new(MemoryJobStore::new());
//!
//!     let runner = TaskRunner::new(store.clone(), pipeline);
//!     let id = store.create(image).await?;
//!     let result = runner.run_sync(id, AnalyzeOptions::default()).await?;
//!     println!("{} face(s), {} blurred", result.total_faces, result.blurred_faces);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod raster;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, FaceclearError, JobError, PipelineError, PipelineResult, Result};
pub use job::{AnalysisJob, JobId, JobStatus, JobSummary, RetryPolicy, TaskRunner};
pub use pipeline::{
    AnalysisPipeline, AnalyzeOptions, Annotator, FaceLocator, ImageDecoder, IngressValidator,
    PipelineOutput, RegionRestorer, RustfaceLocator, SharpnessScorer,
};
pub use raster::RasterImage;
pub use types::{
    AnalysisResult, BlurAnalysis, BlurLevel, BoundingBox, FaceRegion, ScoredFace,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
