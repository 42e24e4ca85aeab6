//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.sharpness.threshold < 0.0 {
            return Err(ConfigError::ValidationError(
                "sharpness.threshold must be >= 0".into(),
            ));
        }
        if self.detector.min_face_size == 0 {
            return Err(ConfigError::ValidationError(
                "detector.min_face_size must be > 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.detector.pyramid_scale_factor)
            || self.detector.pyramid_scale_factor <= 0.0
        {
            return Err(ConfigError::ValidationError(
                "detector.pyramid_scale_factor must be in (0, 1)".into(),
            ));
        }
        if self.detector.slide_window_step == 0 {
            return Err(ConfigError::ValidationError(
                "detector.slide_window_step must be > 0".into(),
            ));
        }
        if self.restore.sharpen_strength <= 0.0 {
            return Err(ConfigError::ValidationError(
                "restore.sharpen_strength must be > 0".into(),
            ));
        }
        if self.restore.sharpen_sigma <= 0.0 {
            return Err(ConfigError::ValidationError(
                "restore.sharpen_sigma must be > 0".into(),
            ));
        }
        if self.restore.clahe_clip_limit < 1.0 {
            return Err(ConfigError::ValidationError(
                "restore.clahe_clip_limit must be >= 1".into(),
            ));
        }
        if self.restore.clahe_grid_size == 0 {
            return Err(ConfigError::ValidationError(
                "restore.clahe_grid_size must be > 0".into(),
            ));
        }
        if self.annotate.thickness == 0 {
            return Err(ConfigError::ValidationError(
                "annotate.thickness must be > 0".into(),
            ));
        }
        if self.limits.max_upload_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.allowed_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "limits.allowed_extensions must not be empty".into(),
            ));
        }
        if self.runner.retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "runner.retry_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }
}
