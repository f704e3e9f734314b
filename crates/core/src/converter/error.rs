//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output file already exists and will not be overwritten.
    #[error("Output file already exists: {path}")]
    OutputExists { path: PathBuf },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Encoder parameters out of range.
    #[error("Invalid conversion settings: {reason}")]
    InvalidSettings { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new invalid settings error.
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            reason: reason.into(),
        }
    }

    /// Short description suitable for a one-line status notice.
    ///
    /// For a failed ffmpeg run this is the first captured stderr line, which
    /// usually names the actual problem.
    pub fn summary(&self) -> String {
        match self {
            Self::ConversionFailed {
                stderr: Some(stderr),
                ..
            } => stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(String::from)
                .unwrap_or_else(|| self.to_string()),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prefers_stderr() {
        let err = ConverterError::conversion_failed(
            "FFmpeg exited with code: Some(1)",
            Some("\n  Invalid data found when processing input\nmore".to_string()),
        );
        assert_eq!(err.summary(), "Invalid data found when processing input");
    }

    #[test]
    fn test_summary_falls_back_to_display() {
        let err = ConverterError::Timeout { timeout_secs: 5 };
        assert_eq!(err.summary(), "Conversion timed out after 5 seconds");

        let err = ConverterError::conversion_failed("Output file not created", None);
        assert_eq!(err.summary(), "Conversion failed: Output file not created");
    }
}
