//! Image decoding with format detection and dimension limits.

use std::io::Cursor;

use image::ImageReader;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::raster::RasterImage;

/// Decodes uploaded bytes into a normalized RGB8 raster.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an in-memory byte buffer into a [`RasterImage`].
    ///
    /// The format is detected from the content, not the file name.
    /// Undecodable bytes map to [`PipelineError::Decode`]; a decoded image
    /// over the dimension cap is rejected as input.
    pub fn decode(&self, bytes: &[u8]) -> Result<RasterImage, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::Decode {
                message: "empty payload".to_string(),
            });
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                message: format!("cannot detect image format: {e}"),
            })?;
        let decoded = reader.decode().map_err(|e| PipelineError::Decode {
            message: e.to_string(),
        })?;

        let raster = RasterImage::new(decoded.to_rgb8());
        if raster.width() > self.limits.max_image_dimension
            || raster.height() > self.limits.max_image_dimension
        {
            return Err(PipelineError::InvalidInput {
                message: format!(
                    "image is {}x{}, dimension cap is {}",
                    raster.width(),
                    raster.height(),
                    self.limits.max_image_dimension
                ),
            });
        }
        if raster.is_empty() {
            return Err(PipelineError::Decode {
                message: "decoded image has zero area".to_string(),
            });
        }

        tracing::debug!("Decoded {}x{} image", raster.width(), raster.height());
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        RasterImage::from_fn(width, height, |x, y| [(x % 256) as u8, (y % 256) as u8, 0])
            .encode_png()
            .unwrap()
    }

    #[test]
    fn test_decode_roundtrip() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let raster = decoder.decode(&png_bytes(64, 48)).unwrap();
        assert_eq!(raster.width(), 64);
        assert_eq!(raster.height(), 48);
        assert_eq!(raster.channels(), 3);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder.decode(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let mut bytes = png_bytes(64, 48);
        bytes.truncate(bytes.len() / 2);
        let err = decoder.decode(&bytes).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        assert!(decoder.decode(&[]).is_err());
    }

    #[test]
    fn test_decode_enforces_dimension_cap() {
        let limits = LimitsConfig {
            max_image_dimension: 32,
            ..LimitsConfig::default()
        };
        let decoder = ImageDecoder::new(limits);
        let err = decoder.decode(&png_bytes(64, 16)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }
}
