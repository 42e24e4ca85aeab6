//! Face-region analysis pipeline components.
//!
//! This module contains all the stages of the analysis pipeline:
//! - **validate**: upload checks before a job exists
//! - **decode**: byte stream to RGB8 raster
//! - **locate**: face detection behind the `FaceLocator` seam
//! - **sharpness**: Laplacian-variance scoring and classification
//! - **restore**: smoothing + sharpening + local contrast for blurred regions
//! - **annotate**: bounding boxes and score labels
//! - **processor**: orchestrates the full pipeline

pub mod annotate;
pub mod decode;
pub mod locate;
pub mod processor;
pub mod restore;
pub mod sharpness;
pub mod validate;

// Re-exports for convenient access
pub use annotate::Annotator;
pub use decode::ImageDecoder;
pub use locate::{FaceLocator, RustfaceLocator};
pub use processor::{AnalysisPipeline, AnalyzeOptions, PipelineOutput};
pub use restore::RegionRestorer;
pub use sharpness::SharpnessScorer;
pub use validate::IngressValidator;
