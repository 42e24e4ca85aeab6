//! Error types for the faceclear analysis pipeline.
//!
//! Errors are organized by stage so callers can tell input problems
//! (rejected before a job exists) apart from processing failures
//! (recorded into the job) and orchestration conflicts.

use thiserror::Error;

use crate::job::{JobId, JobStatus};

/// Top-level error type for faceclear operations.
#[derive(Error, Debug)]
pub enum FaceclearError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Job orchestration errors
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Upload rejected before a job is created: size, extension, or
    /// magic-byte mismatch
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A caller-supplied parameter is out of range
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// Image bytes could not be decoded into a raster
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Face detection failed (model load, empty raster)
    #[error("Detection error: {message}")]
    Detect { message: String },

    /// A region operation referenced pixels outside the buffer
    #[error("Region error: {message}")]
    Region { message: String },

    /// Region restoration failed
    #[error("Restore error: {message}")]
    Restore { message: String },

    /// Annotation failed (font load)
    #[error("Annotate error: {message}")]
    Annotate { message: String },

    /// Unexpected failure inside a pipeline run (worker panic)
    #[error("Pipeline failure: {message}")]
    Internal { message: String },
}

/// Job state machine and store errors.
#[derive(Error, Debug)]
pub enum JobError {
    /// No job with the given id exists in the store
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// A transition the state machine does not permit
    #[error("Invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// The job was already claimed by another worker
    #[error("Job {0} is already being processed")]
    Conflict(JobId),
}

/// Convenience type alias for faceclear results.
pub type Result<T> = std::result::Result<T, FaceclearError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
