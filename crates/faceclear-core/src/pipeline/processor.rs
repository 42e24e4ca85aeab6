//! Pipeline orchestration - wires together all analysis stages.

use std::sync::Arc;

use crate::config::Config;
use crate::error::PipelineError;
use crate::raster::RasterImage;
use crate::types::{AnalysisResult, ScoredFace};

use super::annotate::Annotator;
use super::locate::FaceLocator;
use super::restore::RegionRestorer;
use super::sharpness::SharpnessScorer;

/// Per-request options for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    /// Blur decision threshold; must be >= 0
    pub threshold: f64,
    /// Restore blurred regions and produce an enhanced+annotated image
    pub apply_correction: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            apply_correction: true,
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Aggregate per-face statistics
    pub result: AnalysisResult,
    /// Enhanced+annotated image; present iff correction was requested
    pub enhanced: Option<RasterImage>,
}

/// The analysis pipeline: locate faces, score each region, restore
/// blurred ones, annotate.
///
/// The pipeline is pure with respect to job state: every failure
/// propagates to the caller, and converting failures into job
/// transitions is the task runner's responsibility.
pub struct AnalysisPipeline {
    locator: Arc<dyn FaceLocator>,
    restorer: RegionRestorer,
    annotator: Annotator,
}

impl AnalysisPipeline {
    /// Build a pipeline around a face locator and the given configuration.
    pub fn new(locator: Arc<dyn FaceLocator>, config: &Config) -> Result<Self, PipelineError> {
        Ok(Self {
            locator,
            restorer: RegionRestorer::new(config.restore.clone()),
            annotator: Annotator::new(config.annotate.clone())?,
        })
    }

    /// Run the full analysis over one image.
    ///
    /// Step order is fixed: locate -> crop -> score -> aggregate ->
    /// (restore blurred + composite + annotate, when correction is on).
    /// Identical input and options yield identical results.
    pub fn run(
        &self,
        image: &RasterImage,
        options: &AnalyzeOptions,
    ) -> Result<PipelineOutput, PipelineError> {
        let start = std::time::Instant::now();

        // Parameter validation happens before any work so a bad request
        // never touches job state.
        let scorer = SharpnessScorer::new(options.threshold)?;

        let regions = self.locator.locate(image)?;
        tracing::debug!("Located {} face(s) in {:?}", regions.len(), start.elapsed());

        let score_start = std::time::Instant::now();
        let mut faces = Vec::with_capacity(regions.len());
        for region in regions {
            let crop = image.crop(&region.bounding_box)?;
            let analysis = scorer.analyze(&crop);
            faces.push(ScoredFace { region, analysis });
        }
        tracing::trace!("  Scoring: {:?}", score_start.elapsed());

        let result = AnalysisResult::from_faces(faces);
        tracing::debug!(
            "Scored {} face(s): {} blurred, {} sharp",
            result.total_faces,
            result.blurred_faces,
            result.sharp_faces
        );

        let enhanced = if options.apply_correction {
            let restore_start = std::time::Instant::now();
            let mut composite = image.clone();
            for face in result.faces.iter().filter(|f| f.analysis.is_blurred) {
                let crop = image.crop(&face.region.bounding_box)?;
                let restored = self.restorer.restore(&crop)?;
                composite = composite.overlay(&restored, &face.region.bounding_box)?;
            }
            tracing::trace!("  Restoration: {:?}", restore_start.elapsed());

            Some(self.annotator.annotate(&composite, &result.faces))
        } else {
            None
        };

        tracing::debug!("Pipeline run finished in {:?}", start.elapsed());
        Ok(PipelineOutput { result, enhanced })
    }
}
