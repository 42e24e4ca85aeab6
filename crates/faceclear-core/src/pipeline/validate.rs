//! Upload validation before decode.
//!
//! Everything rejected here is `InvalidInput`: the caller learns about it
//! immediately and no job record is ever created.

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Validates an uploaded byte stream before a job is created.
pub struct IngressValidator {
    limits: LimitsConfig,
}

impl IngressValidator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - File extension is on the allowlist
    /// - Payload size is within the upload cap
    /// - Payload starts with valid JPEG/PNG magic bytes
    pub fn validate(&self, file_name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.limits.allowed_extensions.contains(&extension) {
            return Err(PipelineError::InvalidInput {
                message: format!(
                    "unsupported extension '{extension}' (accepted: {})",
                    self.limits.allowed_extensions.join(", ")
                ),
            });
        }

        let max_bytes = self.limits.max_upload_size_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(PipelineError::InvalidInput {
                message: format!(
                    "payload is {} bytes, cap is {} MiB",
                    bytes.len(),
                    self.limits.max_upload_size_mb
                ),
            });
        }

        if !is_valid_image_header(bytes) {
            return Err(PipelineError::InvalidInput {
                message: "payload does not start with JPEG or PNG magic bytes".to_string(),
            });
        }

        Ok(())
    }
}

/// Check if the leading bytes match a supported raster format.
fn is_valid_image_header(bytes: &[u8]) -> bool {
    if bytes.len() < 4 {
        return false;
    }

    // JPEG: FF D8 FF
    if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        return true;
    }

    // PNG: 89 50 4E 47
    if bytes[0] == 0x89 && bytes[1] == b'P' && bytes[2] == b'N' && bytes[3] == b'G' {
        return true;
    }

    false
}
