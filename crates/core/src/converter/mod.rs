//! Converter module for transcoding image files.
//!
//! This module provides the `Converter` trait and an implementation that
//! shells out to FFmpeg for the two supported conversions.
//!
//! # Features
//!
//! - JPEG to AVIF through an AV1 still-picture encoder (libaom-av1 by default)
//! - AVIF to JPEG through mjpeg
//! - Outputs are never overwritten
//! - Codec capability probing
//!
//! # Example
//!
//! ```ignore
//! use imgconv_core::converter::{
//!     ConversionDirection, ConversionJob, ConversionSettings, Converter, FfmpegConverter,
//! };
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let job = ConversionJob {
//!     job_id: "job-1".to_string(),
//!     direction: ConversionDirection::JpegToAvif,
//!     input_path: PathBuf::from("/photos/a.jpg"),
//!     output_path: PathBuf::from("/out/a.avif"),
//!     settings: ConversionSettings::default(),
//! };
//!
//! let result = converter.convert(job).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use capabilities::EncoderCapabilities;
pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{
    ConversionDirection, ConversionJob, ConversionResult, ConversionSettings,
    ParseDirectionError, MAX_QUANTIZER, MAX_SPEED,
};
