//! Sub-configuration structs with pipeline defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Face detector settings.
///
/// The SeetaFace model is loaded from `model_path` when a locator is
/// constructed; there is no implicit process-wide detector instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Path to the SeetaFace frontal-face model file
    pub model_path: PathBuf,

    /// Smallest face the detector will report, in pixels
    pub min_face_size: u32,

    /// Detector score threshold; raw detections below it are discarded
    pub score_threshold: f64,

    /// Image pyramid scale factor in (0, 1)
    pub pyramid_scale_factor: f32,

    /// Sliding window step in pixels (applied to both axes)
    pub slide_window_step: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("~/.faceclear/models/seeta_fd_frontal_v1.0.bin"),
            min_face_size: 30,
            score_threshold: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: 4,
        }
    }
}

/// Sharpness scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpnessConfig {
    /// Default blur decision threshold; callers may override per request
    pub threshold: f64,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self { threshold: 100.0 }
    }
}

/// Region restoration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    /// Bilateral filter window radius in pixels
    pub smoothing_radius: u32,

    /// Bilateral filter range sigma (color distance)
    pub smoothing_sigma_color: f64,

    /// Bilateral filter spatial sigma
    pub smoothing_sigma_space: f64,

    /// Unsharp mask strength factor k in `original*(1+k) - blurred*k`
    pub sharpen_strength: f64,

    /// Gaussian sigma for the unsharp mask's blurred copy
    pub sharpen_sigma: f32,

    /// Contrast-limited equalization clip limit on the luminance channel
    pub clahe_clip_limit: f64,

    /// Equalization tile grid size (grid x grid tiles)
    pub clahe_grid_size: u32,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            smoothing_radius: 4,
            smoothing_sigma_color: 75.0,
            smoothing_sigma_space: 75.0,
            sharpen_strength: 2.0,
            sharpen_sigma: 3.0,
            clahe_clip_limit: 3.0,
            clahe_grid_size: 8,
        }
    }
}

/// Annotation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// TTF/OTF font for labels. With no font, boxes are drawn and label
    /// text is skipped.
    pub font_path: Option<PathBuf>,

    /// Label font scale in pixels
    pub font_scale: f32,

    /// Rectangle border thickness in pixels
    pub thickness: u32,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_scale: 16.0,
            thickness: 2,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in mebibytes
    pub max_upload_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Accepted upload file extensions (lowercase, no dot)
    pub allowed_extensions: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 10,
            max_image_dimension: 10000,
            allowed_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
            ],
        }
    }
}

/// Task runner settings for asynchronous retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Max attempts for a deferred job (first run + retries)
    pub retry_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 60_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
