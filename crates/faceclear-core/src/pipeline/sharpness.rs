//! Sharpness scoring via Laplacian variance.
//!
//! The variance of a second-derivative edge response is the standard
//! optical-focus proxy: sharp regions keep their high-frequency edge
//! content, blurred regions have it smoothed away.

use image::GrayImage;

use crate::error::PipelineError;
use crate::raster::RasterImage;
use crate::types::{BlurAnalysis, BlurLevel};

/// Scores face regions and classifies them against a decision threshold.
#[derive(Debug, Clone, Copy)]
pub struct SharpnessScorer {
    threshold: f64,
}

impl SharpnessScorer {
    /// Create a scorer with the given blur decision threshold.
    ///
    /// Negative thresholds are rejected with `InvalidParameter`.
    pub fn new(threshold: f64) -> Result<Self, PipelineError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PipelineError::InvalidParameter {
                name: "threshold",
                message: format!("must be a finite value >= 0, got {threshold}"),
            });
        }
        Ok(Self { threshold })
    }

    /// The decision threshold this scorer was built with.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compute the sharpness score of a region.
    ///
    /// Pure function: intensity projection, 3x3 Laplacian, variance of
    /// the response. A uniform-color region scores 0.
    pub fn score(region: &RasterImage) -> f64 {
        laplacian_variance(&region.to_luma())
    }

    /// True iff the score falls below the threshold. Boundary equality
    /// classifies as not blurred.
    pub fn is_blurred(&self, score: f64) -> bool {
        score < self.threshold
    }

    /// Score a region and bundle the verdict.
    pub fn analyze(&self, region: &RasterImage) -> BlurAnalysis {
        BlurAnalysis::new(Self::score(region), self.threshold)
    }

    /// Fixed-band classification, independent of the threshold.
    pub fn classify(score: f64) -> BlurLevel {
        BlurLevel::from_score(score)
    }
}

impl Default for SharpnessScorer {
    fn default() -> Self {
        Self { threshold: 100.0 }
    }
}

/// Variance of the 4-neighbor Laplacian over interior pixels.
///
/// Kernel `[0,1,0; 1,-4,1; 0,1,0]`; accumulation in f64. Images thinner
/// than 3 px have no interior and score 0.
fn laplacian_variance(img: &GrayImage) -> f64 {
    let (w, h) = (img.width() as i64, img.height() as i64);
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = f64::from(img.get_pixel(x as u32, y as u32).0[0]);
            let top = f64::from(img.get_pixel(x as u32, (y - 1) as u32).0[0]);
            let bottom = f64::from(img.get_pixel(x as u32, (y + 1) as u32).0[0]);
            let left = f64::from(img.get_pixel((x - 1) as u32, y as u32).0[0]);
            let right = f64::from(img.get_pixel((x + 1) as u32, y as u32).0[0]);

            let response = top + bottom + left + right - 4.0 * center;
            sum += response;
            sum_sq += response * response;
            count += 1;
        }
    }

    let mean = sum / count as f64;
    let variance = sum_sq / count as f64 - mean * mean;
    variance.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterImage;

    fn uniform(width: u32, height: u32, value: u8) -> RasterImage {
        RasterImage::from_fn(width, height, |_, _| [value, value, value])
    }

    fn checkerboard(width: u32, height: u32) -> RasterImage {
        RasterImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                [255, 255, 255]
            } else {
                [0, 0, 0]
            }
        })
    }

    #[test]
    fn test_uniform_region_scores_zero() {
        assert_eq!(SharpnessScorer::score(&uniform(100, 100, 128)), 0.0);
    }

    #[test]
    fn test_linear_ramp_scores_zero() {
        // A linear gradient has a zero second derivative everywhere
        let ramp = RasterImage::from_fn(64, 64, |x, _| {
            let v = (x * 4) as u8;
            [v, v, v]
        });
        assert!(SharpnessScorer::score(&ramp) < 1e-9);
    }

    #[test]
    fn test_checkerboard_scores_high() {
        assert!(SharpnessScorer::score(&checkerboard(50, 50)) > 200.0);
    }

    #[test]
    fn test_tiny_region_scores_zero() {
        assert_eq!(SharpnessScorer::score(&uniform(2, 10, 42)), 0.0);
    }

    #[test]
    fn test_blur_reduces_score() {
        let sharp = checkerboard(60, 60);
        let blurred = RasterImage::new(image::imageops::blur(sharp.as_rgb(), 2.0));
        assert!(SharpnessScorer::score(&blurred) < SharpnessScorer::score(&sharp));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = SharpnessScorer::new(-1.0).err().unwrap();
        assert!(matches!(
            err,
            PipelineError::InvalidParameter { name: "threshold", .. }
        ));
        assert!(SharpnessScorer::new(f64::NAN).is_err());
    }

    #[test]
    fn test_boundary_score_is_not_blurred() {
        let scorer = SharpnessScorer::new(100.0).unwrap();
        assert!(!scorer.is_blurred(100.0));
        assert!(scorer.is_blurred(99.99));
    }

    #[test]
    fn test_analyze_uniform_is_severe() {
        let scorer = SharpnessScorer::default();
        let analysis = scorer.analyze(&uniform(100, 100, 77));
        assert_eq!(analysis.blur_score, 0.0);
        assert!(analysis.is_blurred);
        assert_eq!(analysis.blur_level, BlurLevel::Severe);
    }
}
