//! Configuration management for faceclear.
//!
//! Configuration is loaded from a platform config directory with sensible
//! defaults. All config structs implement `Default`, so a missing file
//! means default behavior, not an error.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for faceclear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Face detector settings
    pub detector: DetectorConfig,

    /// Sharpness scoring settings
    pub sharpness: SharpnessConfig,

    /// Region restoration settings
    pub restore: RestoreConfig,

    /// Annotation settings
    pub annotate: AnnotateConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Task runner settings
    pub runner: RunnerConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// ~/.faceclear/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "faceclear", "faceclear")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".faceclear").join("config.toml")
            })
    }

    /// Get the resolved detector model path (with ~ expansion).
    pub fn model_path(&self) -> PathBuf {
        let path_str = self.detector.model_path.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved label font path, if one is configured.
    pub fn font_path(&self) -> Option<PathBuf> {
        self.annotate.font_path.as_ref().map(|p| {
            let path_str = p.to_string_lossy();
            let expanded = shellexpand::tilde(&path_str);
            PathBuf::from(expanded.into_owned())
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
