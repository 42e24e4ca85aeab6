//! Result annotation: bounding boxes and score labels.
//!
//! Boxes are colored by blur state (red for blurred, green for sharp).
//! Labels need a configured font; without one the boxes are still drawn
//! and label text is skipped. Overlays follow detection order, so later
//! boxes may cover earlier ones where faces overlap.

use ab_glyph::{FontVec, PxScale};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::config::AnnotateConfig;
use crate::error::PipelineError;
use crate::raster::RasterImage;
use crate::types::ScoredFace;

const BLURRED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const SHARP_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Draws analysis overlays onto a copy of the full image.
pub struct Annotator {
    config: AnnotateConfig,
    font: Option<FontVec>,
}

impl Annotator {
    /// Create an annotator, loading the label font if one is configured.
    pub fn new(config: AnnotateConfig) -> Result<Self, PipelineError> {
        let font = match &config.font_path {
            Some(path) => {
                let data = std::fs::read(path).map_err(|e| PipelineError::Annotate {
                    message: format!("cannot read font {}: {e}", path.display()),
                })?;
                let font = FontVec::try_from_vec(data).map_err(|e| PipelineError::Annotate {
                    message: format!("cannot parse font {}: {e}", path.display()),
                })?;
                Some(font)
            }
            None => None,
        };
        Ok(Self { config, font })
    }

    /// Draw a box and label per scored face onto a new buffer.
    ///
    /// The input image is not modified. With no faces the output equals
    /// the input.
    pub fn annotate(&self, image: &RasterImage, faces: &[ScoredFace]) -> RasterImage {
        let mut canvas = image.as_rgb().clone();

        for face in faces {
            let bbox = &face.region.bounding_box;
            let color = if face.analysis.is_blurred {
                BLURRED_COLOR
            } else {
                SHARP_COLOR
            };

            // Nested hollow rects, shrinking inward, for line thickness
            for i in 0..self.config.thickness {
                if bbox.width <= 2 * i || bbox.height <= 2 * i {
                    break;
                }
                let rect = Rect::at((bbox.x + i) as i32, (bbox.y + i) as i32)
                    .of_size(bbox.width - 2 * i, bbox.height - 2 * i);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            if let Some(font) = &self.font {
                let status = if face.analysis.is_blurred {
                    "BLURRED"
                } else {
                    "SHARP"
                };
                let label = format!("Face {}: {status}", face.region.face_id);
                let score_label = format!("Score: {:.1}", face.analysis.blur_score);
                let scale = PxScale::from(self.config.font_scale);

                let x = bbox.x as i32;
                let label_y = (bbox.y as i32 - 25).max(0);
                let score_y = (bbox.y as i32 - 10).max(0);
                draw_text_mut(&mut canvas, color, x, label_y, scale, font, &label);
                draw_text_mut(&mut canvas, color, x, score_y, scale, font, &score_label);
            }
        }

        RasterImage::new(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlurAnalysis, BoundingBox, FaceRegion};

    fn gray_image(width: u32, height: u32) -> RasterImage {
        RasterImage::from_fn(width, height, |_, _| [128, 128, 128])
    }

    fn scored_face(bbox: BoundingBox, score: f64) -> ScoredFace {
        ScoredFace {
            region: FaceRegion::new(1, bbox, 0.9, 100, 100).unwrap(),
            analysis: BlurAnalysis::new(score, 100.0),
        }
    }

    fn annotator() -> Annotator {
        Annotator::new(AnnotateConfig::default()).unwrap()
    }

    #[test]
    fn test_no_faces_output_equals_input() {
        let img = gray_image(100, 100);
        let out = annotator().annotate(&img, &[]);
        assert_eq!(out, img);
    }

    #[test]
    fn test_input_is_not_modified() {
        let img = gray_image(100, 100);
        let before = img.clone();
        let face = scored_face(BoundingBox::new(10, 10, 30, 30), 250.0);
        let _ = annotator().annotate(&img, &[face]);
        assert_eq!(img, before);
    }

    #[test]
    fn test_sharp_face_gets_green_border() {
        let img = gray_image(100, 100);
        let face = scored_face(BoundingBox::new(10, 10, 30, 30), 250.0);
        let out = annotator().annotate(&img, &[face]);
        assert_eq!(*out.as_rgb().get_pixel(10, 10), SHARP_COLOR);
        // Second nested ring, one pixel in
        assert_eq!(*out.as_rgb().get_pixel(11, 11), SHARP_COLOR);
    }

    #[test]
    fn test_blurred_face_gets_red_border() {
        let img = gray_image(100, 100);
        let face = scored_face(BoundingBox::new(20, 20, 40, 40), 12.0);
        let out = annotator().annotate(&img, &[face]);
        assert_eq!(*out.as_rgb().get_pixel(20, 20), BLURRED_COLOR);
    }

    #[test]
    fn test_interior_pixels_untouched() {
        let img = gray_image(100, 100);
        let face = scored_face(BoundingBox::new(10, 10, 30, 30), 250.0);
        let out = annotator().annotate(&img, &[face]);
        assert_eq!(out.as_rgb().get_pixel(25, 25).0, [128, 128, 128]);
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let config = AnnotateConfig {
            font_path: Some("/nonexistent/font.ttf".into()),
            ..AnnotateConfig::default()
        };
        let err = Annotator::new(config).err().unwrap();
        assert!(matches!(err, PipelineError::Annotate { .. }));
    }

    #[test]
    fn test_tiny_box_does_not_panic() {
        let img = gray_image(100, 100);
        let face = scored_face(BoundingBox::new(5, 5, 2, 2), 10.0);
        let out = annotator().annotate(&img, &[face]);
        assert_eq!(*out.as_rgb().get_pixel(5, 5), BLURRED_COLOR);
    }
}
