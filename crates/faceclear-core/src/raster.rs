//! In-memory raster image with copy-on-write region operations.
//!
//! `RasterImage` owns a decoded RGB8 buffer. Components never mutate a
//! raster they received; `crop` and `overlay` return new buffers, so the
//! source image survives a pipeline run unchanged.

use std::io::Cursor;

use image::{imageops, GrayImage, ImageFormat, RgbImage};

use crate::error::PipelineError;
use crate::types::BoundingBox;

/// A decoded image buffer plus geometry helpers.
#[derive(Clone, PartialEq)]
pub struct RasterImage {
    buffer: RgbImage,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("channels", &self.channels())
            .finish()
    }
}

impl RasterImage {
    /// Wrap an RGB8 buffer.
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Build a raster from a per-pixel function. Used heavily in tests.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> Self {
        Self {
            buffer: RgbImage::from_fn(width, height, |x, y| image::Rgb(f(x, y))),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Channel count. Buffers are normalized to RGB8 at decode.
    pub fn channels(&self) -> u8 {
        3
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Borrow the underlying RGB buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.buffer
    }

    /// Consume the raster, returning the underlying buffer.
    pub fn into_rgb(self) -> RgbImage {
        self.buffer
    }

    /// Single-channel intensity projection (ITU-R BT.601 luma).
    pub fn to_luma(&self) -> GrayImage {
        imageops::grayscale(&self.buffer)
    }

    /// Copy the pixels under `bbox` into a new raster.
    ///
    /// The box must lie fully inside the buffer and have nonzero area.
    pub fn crop(&self, bbox: &BoundingBox) -> Result<RasterImage, PipelineError> {
        self.check_bounds(bbox)?;
        let view = imageops::crop_imm(&self.buffer, bbox.x, bbox.y, bbox.width, bbox.height);
        Ok(RasterImage::new(view.to_image()))
    }

    /// Return a copy of this raster with `patch` composited at `bbox`.
    ///
    /// The patch dimensions must match the box exactly; the receiver is
    /// left untouched.
    pub fn overlay(&self, patch: &RasterImage, bbox: &BoundingBox) -> Result<RasterImage, PipelineError> {
        self.check_bounds(bbox)?;
        if patch.width() != bbox.width || patch.height() != bbox.height {
            return Err(PipelineError::Region {
                message: format!(
                    "patch {}x{} does not match box {}x{}",
                    patch.width(),
                    patch.height(),
                    bbox.width,
                    bbox.height
                ),
            });
        }
        let mut out = self.buffer.clone();
        imageops::overlay(&mut out, &patch.buffer, i64::from(bbox.x), i64::from(bbox.y));
        Ok(RasterImage::new(out))
    }

    /// Encode the buffer as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, PipelineError> {
        let mut cursor = Cursor::new(Vec::new());
        self.buffer
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| PipelineError::Decode {
                message: format!("PNG encode failed: {e}"),
            })?;
        Ok(cursor.into_inner())
    }

    fn check_bounds(&self, bbox: &BoundingBox) -> Result<(), PipelineError> {
        let fits = bbox.width > 0
            && bbox.height > 0
            && bbox.x.checked_add(bbox.width).is_some_and(|r| r <= self.width())
            && bbox.y.checked_add(bbox.height).is_some_and(|b| b <= self.height());
        if fits {
            Ok(())
        } else {
            Err(PipelineError::Region {
                message: format!(
                    "box ({},{} {}x{}) outside {}x{} buffer",
                    bbox.x,
                    bbox.y,
                    bbox.width,
                    bbox.height,
                    self.width(),
                    self.height()
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_crop_dimensions() {
        let img = checkerboard(100, 80);
        let bbox = BoundingBox::new(10, 20, 30, 40);
        let crop = img.crop(&bbox).unwrap();
        assert_eq!(crop.width(), 30);
        assert_eq!(crop.height(), 40);
    }

    #[test]
    fn test_crop_rejects_out_of_bounds() {
        let img = checkerboard(50, 50);
        let bbox = BoundingBox::new(40, 40, 20, 20);
        assert!(matches!(
            img.crop(&bbox),
            Err(PipelineError::Region { .. })
        ));
    }

    #[test]
    fn test_crop_rejects_zero_area() {
        let img = checkerboard(50, 50);
        let bbox = BoundingBox::new(10, 10, 0, 5);
        assert!(img.crop(&bbox).is_err());
    }

    #[test]
    fn test_overlay_leaves_source_untouched() {
        let img = checkerboard(50, 50);
        let before = img.clone();
        let patch = RasterImage::from_fn(10, 10, |_, _| [7, 7, 7]);
        let bbox = BoundingBox::new(5, 5, 10, 10);
        let out = img.overlay(&patch, &bbox).unwrap();

        assert_eq!(img, before);
        assert_eq!(out.as_rgb().get_pixel(5, 5).0, [7, 7, 7]);
        assert_eq!(out.as_rgb().get_pixel(4, 5), img.as_rgb().get_pixel(4, 5));
    }

    #[test]
    fn test_overlay_rejects_mismatched_patch() {
        let img = checkerboard(50, 50);
        let patch = RasterImage::from_fn(9, 10, |_, _| [0, 0, 0]);
        let bbox = BoundingBox::new(5, 5, 10, 10);
        assert!(img.overlay(&patch, &bbox).is_err());
    }

    #[test]
    fn test_roundtrip_crop_overlay_is_identity() {
        let img = checkerboard(40, 40);
        let bbox = BoundingBox::new(8, 8, 16, 16);
        let crop = img.crop(&bbox).unwrap();
        let out = img.overlay(&crop, &bbox).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_encode_png_magic() {
        let img = checkerboard(16, 16);
        let bytes = img.encode_png().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
