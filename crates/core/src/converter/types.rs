//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::ConverterError;

/// Which format conversion a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDirection {
    /// JPEG sources, AVIF outputs.
    #[default]
    JpegToAvif,
    /// AVIF sources, JPEG outputs.
    AvifToJpeg,
}

impl ConversionDirection {
    /// Extensions (lowercase, without the dot) of the files this direction reads.
    pub fn source_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::JpegToAvif => &["jpeg", "jpg"],
            Self::AvifToJpeg => &["avif"],
        }
    }

    /// Extension given to every output file.
    pub fn target_extension(&self) -> &'static str {
        match self {
            Self::JpegToAvif => "avif",
            Self::AvifToJpeg => "jpg",
        }
    }

    /// Command-line spelling of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JpegToAvif => "jpeg-to-avif",
            Self::AvifToJpeg => "avif-to-jpeg",
        }
    }
}

impl fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a direction name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown conversion direction '{0}' (expected jpeg-to-avif or avif-to-jpeg)")]
pub struct ParseDirectionError(pub String);

impl FromStr for ConversionDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "jpeg-to-avif" | "jpg-to-avif" => Ok(Self::JpegToAvif),
            "avif-to-jpeg" | "avif-to-jpg" => Ok(Self::AvifToJpeg),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// Encoder parameters forwarded unchanged to the converter.
///
/// The worker never looks inside; it snapshots the value when a job starts and
/// attaches it to every [`ConversionJob`] of that job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// JPEG output quality, 1 (worst) to 100 (best).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Lowest AV1 quantizer the encoder may use (0-63, lower is better).
    #[serde(default = "default_min_quantizer")]
    pub min_quantizer: u8,

    /// Highest AV1 quantizer the encoder may use (0-63).
    #[serde(default = "default_max_quantizer")]
    pub max_quantizer: u8,

    /// AV1 encoder speed preset, 0 (slowest) to 8.
    #[serde(default = "default_speed")]
    pub speed: u8,
}

/// Highest quantizer accepted by AV1 encoders.
pub const MAX_QUANTIZER: u8 = 63;

/// Fastest supported encoder speed preset.
pub const MAX_SPEED: u8 = 8;

fn default_jpeg_quality() -> u8 {
    90
}

fn default_min_quantizer() -> u8 {
    10
}

fn default_max_quantizer() -> u8 {
    30
}

fn default_speed() -> u8 {
    6
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            min_quantizer: default_min_quantizer(),
            max_quantizer: default_max_quantizer(),
            speed: default_speed(),
        }
    }
}

impl ConversionSettings {
    /// Sets the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Sets the quantizer range.
    pub fn with_quantizers(mut self, min: u8, max: u8) -> Self {
        self.min_quantizer = min;
        self.max_quantizer = max;
        self
    }

    /// Sets the encoder speed preset.
    pub fn with_speed(mut self, speed: u8) -> Self {
        self.speed = speed;
        self
    }

    /// Checks that every parameter is within the range the encoders accept.
    pub fn validate(&self) -> Result<(), ConverterError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConverterError::invalid_settings(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.max_quantizer > MAX_QUANTIZER {
            return Err(ConverterError::invalid_settings(format!(
                "max_quantizer must be at most {}, got {}",
                MAX_QUANTIZER, self.max_quantizer
            )));
        }
        if self.min_quantizer > self.max_quantizer {
            return Err(ConverterError::invalid_settings(format!(
                "min_quantizer ({}) exceeds max_quantizer ({})",
                self.min_quantizer, self.max_quantizer
            )));
        }
        if self.speed > MAX_SPEED {
            return Err(ConverterError::invalid_settings(format!(
                "speed must be at most {}, got {}",
                MAX_SPEED, self.speed
            )));
        }
        Ok(())
    }
}

/// A single-file conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Identifier of the job, unique per file.
    pub job_id: String,
    /// Conversion to perform.
    pub direction: ConversionDirection,
    /// File to read.
    pub input_path: PathBuf,
    /// File to create. Must not exist yet.
    pub output_path: PathBuf,
    /// Encoder parameters.
    pub settings: ConversionSettings,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Job identifier.
    pub job_id: String,
    /// Path of the created file.
    pub output_path: PathBuf,
    /// Size of the created file.
    pub output_size_bytes: u64,
    /// Wall time spent converting.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_extensions() {
        assert_eq!(
            ConversionDirection::JpegToAvif.source_extensions(),
            &["jpeg", "jpg"]
        );
        assert_eq!(ConversionDirection::JpegToAvif.target_extension(), "avif");
        assert_eq!(ConversionDirection::AvifToJpeg.source_extensions(), &["avif"]);
        assert_eq!(ConversionDirection::AvifToJpeg.target_extension(), "jpg");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(
            "jpeg-to-avif".parse::<ConversionDirection>().unwrap(),
            ConversionDirection::JpegToAvif
        );
        assert_eq!(
            "AVIF_TO_JPEG".parse::<ConversionDirection>().unwrap(),
            ConversionDirection::AvifToJpeg
        );
        assert!("png-to-avif".parse::<ConversionDirection>().is_err());
    }

    #[test]
    fn test_direction_display_roundtrips_through_parse() {
        for direction in [ConversionDirection::JpegToAvif, ConversionDirection::AvifToJpeg] {
            assert_eq!(direction.to_string().parse::<ConversionDirection>().unwrap(), direction);
        }
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&ConversionDirection::AvifToJpeg).unwrap();
        assert_eq!(json, "\"avif_to_jpeg\"");
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = ConversionSettings::default();
        assert_eq!(settings.jpeg_quality, 90);
        assert_eq!(settings.min_quantizer, 10);
        assert_eq!(settings.max_quantizer, 30);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        assert!(ConversionSettings::default()
            .with_jpeg_quality(0)
            .validate()
            .is_err());
        assert!(ConversionSettings::default()
            .with_quantizers(40, 20)
            .validate()
            .is_err());
        assert!(ConversionSettings::default()
            .with_quantizers(0, 64)
            .validate()
            .is_err());
        assert!(ConversionSettings::default().with_speed(9).validate().is_err());
        assert!(ConversionSettings::default()
            .with_quantizers(0, 63)
            .with_jpeg_quality(100)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_settings_partial_deserialization() {
        let settings: ConversionSettings = toml::from_str("jpeg_quality = 75").unwrap();
        assert_eq!(settings.jpeg_quality, 75);
        assert_eq!(settings.max_quantizer, 30);
    }
}
