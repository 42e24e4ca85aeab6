//! Core domain types for face-region analysis.
//!
//! These are immutable value types: a detected face region, the blur
//! analysis attached to it after scoring, and the aggregate result for
//! one image. Invariants are checked at construction, never after.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Axis-aligned rectangle locating a face in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Create a bounding box. Validity against an image is checked by
    /// [`FaceRegion::new`] and the raster operations that consume it.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// One detected face: sequential id, location, and detector confidence.
///
/// Regions are ordered by detection order, not spatial order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    /// Sequential id, starting at 1, unique within one detection pass
    pub face_id: u32,
    /// Location in full-image pixel coordinates
    pub bounding_box: BoundingBox,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}

impl FaceRegion {
    /// Construct a validated face region.
    ///
    /// Rejects ids below 1, zero-area boxes, boxes extending past the
    /// `image_width` x `image_height` frame, and confidence outside [0, 1].
    pub fn new(
        face_id: u32,
        bounding_box: BoundingBox,
        confidence: f64,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, PipelineError> {
        if face_id == 0 {
            return Err(PipelineError::Region {
                message: "face_id must be >= 1".to_string(),
            });
        }
        let fits = bounding_box.area() > 0
            && bounding_box
                .x
                .checked_add(bounding_box.width)
                .is_some_and(|r| r <= image_width)
            && bounding_box
                .y
                .checked_add(bounding_box.height)
                .is_some_and(|b| b <= image_height);
        if !fits {
            return Err(PipelineError::Region {
                message: format!(
                    "face {face_id} box ({},{} {}x{}) outside {image_width}x{image_height} image",
                    bounding_box.x, bounding_box.y, bounding_box.width, bounding_box.height
                ),
            });
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(PipelineError::Region {
                message: format!("face {face_id} confidence {confidence} outside [0, 1]"),
            });
        }
        Ok(Self {
            face_id,
            bounding_box,
            confidence,
        })
    }
}

/// Coarse qualitative sharpness bucket.
///
/// A pure function of the blur score with fixed band edges, independent
/// of the blur decision threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurLevel {
    Severe,
    Moderate,
    Slight,
    Sharp,
}

impl BlurLevel {
    /// Bucket a score: `<50` severe, `<100` moderate, `<200` slight,
    /// otherwise sharp.
    pub fn from_score(score: f64) -> Self {
        if score < 50.0 {
            Self::Severe
        } else if score < 100.0 {
            Self::Moderate
        } else if score < 200.0 {
            Self::Slight
        } else {
            Self::Sharp
        }
    }
}

/// Sharpness verdict for one face region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurAnalysis {
    /// Variance of the Laplacian response, >= 0, rounded to 2 decimals
    pub blur_score: f64,
    /// True iff `blur_score < threshold`
    pub is_blurred: bool,
    /// The decision threshold this analysis was made against
    pub threshold: f64,
    /// Fixed-band classification of the score
    pub blur_level: BlurLevel,
}

impl BlurAnalysis {
    /// Derive an analysis from a raw score and decision threshold.
    ///
    /// The score is rounded to two decimals first so the stored record
    /// is self-consistent: `is_blurred` and `blur_level` are computed
    /// from the rounded value.
    pub fn new(raw_score: f64, threshold: f64) -> Self {
        let blur_score = round2(raw_score.max(0.0));
        Self {
            blur_score,
            is_blurred: blur_score < threshold,
            threshold,
            blur_level: BlurLevel::from_score(blur_score),
        }
    }
}

/// A face region paired with its blur analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredFace {
    pub region: FaceRegion,
    pub analysis: BlurAnalysis,
}

/// Aggregate statistics for one analyzed image.
///
/// Always derived from the face list via [`AnalysisResult::from_faces`];
/// never constructed field-by-field, so the counts cannot drift from the
/// faces they summarize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_faces: usize,
    pub blurred_faces: usize,
    pub sharp_faces: usize,
    pub faces: Vec<ScoredFace>,
    pub average_blur_score: f64,
    pub min_blur_score: f64,
    pub max_blur_score: f64,
    /// Share of faces flagged blurred, 0-100
    pub blur_percentage: f64,
}

impl AnalysisResult {
    /// Compute the aggregate for a scored face list.
    ///
    /// An empty list yields the all-zero summary.
    pub fn from_faces(faces: Vec<ScoredFace>) -> Self {
        let total_faces = faces.len();
        if total_faces == 0 {
            return Self {
                total_faces: 0,
                blurred_faces: 0,
                sharp_faces: 0,
                faces,
                average_blur_score: 0.0,
                min_blur_score: 0.0,
                max_blur_score: 0.0,
                blur_percentage: 0.0,
            };
        }

        let blurred_faces = faces.iter().filter(|f| f.analysis.is_blurred).count();
        let sum: f64 = faces.iter().map(|f| f.analysis.blur_score).sum();
        let min = faces
            .iter()
            .map(|f| f.analysis.blur_score)
            .fold(f64::INFINITY, f64::min);
        let max = faces
            .iter()
            .map(|f| f.analysis.blur_score)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            total_faces,
            blurred_faces,
            sharp_faces: total_faces - blurred_faces,
            average_blur_score: round2(sum / total_faces as f64),
            min_blur_score: min,
            max_blur_score: max,
            blur_percentage: round2(blurred_faces as f64 / total_faces as f64 * 100.0),
            faces,
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
