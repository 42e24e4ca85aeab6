//! Face localization.
//!
//! `FaceLocator` is the seam between the pipeline and a concrete
//! detection backend. The production backend wraps the `rustface`
//! SeetaFace engine; tests substitute stub locators.

use std::io::Read;
use std::path::Path;

use crate::config::DetectorConfig;
use crate::error::PipelineError;
use crate::raster::RasterImage;
use crate::types::{BoundingBox, FaceRegion};

/// Divisor that maps raw SeetaFace classifier scores into [0, 1].
/// Scores above this land at confidence 1.0.
const CONFIDENCE_SCALE: f64 = 40.0;

/// Pluggable face detection backend.
///
/// Implementations must be deterministic for a fixed image and fixed
/// configuration, must not mutate the input image, and must return an
/// empty list (not an error) when no faces are found.
pub trait FaceLocator: Send + Sync {
    /// Detect faces, ordered by detection order, ids assigned 1..n.
    fn locate(&self, image: &RasterImage) -> Result<Vec<FaceRegion>, PipelineError>;
}

/// Face locator backed by the `rustface` crate (SeetaFace engine).
///
/// The model is loaded once at construction from a configured path; no
/// process-wide detector state exists. Detector parameters come from
/// [`DetectorConfig`].
pub struct RustfaceLocator {
    model: rustface::Model,
    config: DetectorConfig,
}

impl RustfaceLocator {
    /// Load the SeetaFace model from a file.
    pub fn from_file(path: &Path, config: DetectorConfig) -> Result<Self, PipelineError> {
        let file = std::fs::File::open(path).map_err(|e| PipelineError::Detect {
            message: format!("cannot open detection model {}: {e}", path.display()),
        })?;
        Self::from_reader(std::io::BufReader::new(file), config)
    }

    /// Load the SeetaFace model from any reader (embedded bytes, file).
    pub fn from_reader<R: Read>(reader: R, config: DetectorConfig) -> Result<Self, PipelineError> {
        let model = rustface::read_model(reader).map_err(|e| PipelineError::Detect {
            message: format!("failed to read detection model: {e}"),
        })?;
        Ok(Self { model, config })
    }
}

impl FaceLocator for RustfaceLocator {
    fn locate(&self, image: &RasterImage) -> Result<Vec<FaceRegion>, PipelineError> {
        if image.is_empty() {
            return Err(PipelineError::Detect {
                message: "cannot run detection on an empty raster".to_string(),
            });
        }

        let gray = image.to_luma();

        // The rustface detector is stateful across calls, so a fresh one
        // is built per detection pass from the shared model.
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.config.min_face_size);
        detector.set_score_thresh(self.config.score_threshold);
        detector.set_pyramid_scale_factor(self.config.pyramid_scale_factor);
        detector.set_slide_window_step(
            self.config.slide_window_step,
            self.config.slide_window_step,
        );

        let detections = detector.detect(&rustface::ImageData::new(
            gray.as_raw(),
            gray.width(),
            gray.height(),
        ));

        let mut regions = Vec::with_capacity(detections.len());
        for info in &detections {
            let bbox = info.bbox();
            let Some(clamped) = clamp_detection(
                bbox.x(),
                bbox.y(),
                bbox.width(),
                bbox.height(),
                image.width(),
                image.height(),
            ) else {
                continue;
            };
            let confidence = (info.score() / CONFIDENCE_SCALE).clamp(0.0, 1.0);
            let face_id = regions.len() as u32 + 1;
            regions.push(FaceRegion::new(
                face_id,
                clamped,
                confidence,
                image.width(),
                image.height(),
            )?);
        }

        tracing::debug!("Detected {} face(s)", regions.len());
        Ok(regions)
    }
}

/// Clamp a raw detection rectangle to the image frame.
///
/// SeetaFace can report boxes that start left/above the frame or run past
/// its edges. Returns `None` when nothing of the box survives clamping.
fn clamp_detection(
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    image_width: u32,
    image_height: u32,
) -> Option<BoundingBox> {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = x
        .saturating_add(width.min(i32::MAX as u32) as i32)
        .clamp(0, image_width.min(i32::MAX as u32) as i32) as u32;
    let y1 = y
        .saturating_add(height.min(i32::MAX as u32) as i32)
        .clamp(0, image_height.min(i32::MAX as u32) as i32) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(BoundingBox::new(x0, y0, x1 - x0, y1 - y0))
}
