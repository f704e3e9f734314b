//! Codec capability detection.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::process::Stdio;
use tokio::process::Command;

use super::config::ConverterConfig;
use super::types::ConversionDirection;

/// Matches codec listing lines such as ` V....D libaom-av1   libaom AV1 (codec av1)`.
static CODEC_LINE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*[VAS][A-Z.]{5}\s+([A-Za-z0-9_-]+)\s").ok());

/// AV1 decoders ffmpeg can use to read AVIF input.
const AV1_DECODERS: &[&str] = &["libdav1d", "libaom-av1", "av1"];

/// Codecs detected in the local ffmpeg build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderCapabilities {
    /// Names from `ffmpeg -encoders`.
    pub encoders: BTreeSet<String>,
    /// Names from `ffmpeg -decoders`.
    pub decoders: BTreeSet<String>,
}

impl EncoderCapabilities {
    /// Detect available codecs by probing ffmpeg.
    ///
    /// A missing or failing ffmpeg yields empty capabilities rather than an error.
    pub async fn detect(config: &ConverterConfig) -> Self {
        Self {
            encoders: list_codecs(config, "-encoders").await,
            decoders: list_codecs(config, "-decoders").await,
        }
    }

    /// Builds capabilities from captured `-encoders` and `-decoders` listings.
    pub fn from_listings(encoders: &str, decoders: &str) -> Self {
        Self {
            encoders: parse_codec_listing(encoders),
            decoders: parse_codec_listing(decoders),
        }
    }

    /// Whether the configured AVIF encoder is present.
    pub fn can_encode_avif(&self, config: &ConverterConfig) -> bool {
        self.encoders.contains(&config.avif_encoder)
    }

    /// Whether any AV1 decoder is present.
    pub fn can_decode_avif(&self) -> bool {
        AV1_DECODERS.iter().any(|d| self.decoders.contains(*d))
    }

    /// Whether ffmpeg can perform the given conversion.
    pub fn supports(&self, direction: ConversionDirection, config: &ConverterConfig) -> bool {
        match direction {
            ConversionDirection::JpegToAvif => {
                self.decoders.contains("mjpeg") && self.can_encode_avif(config)
            }
            ConversionDirection::AvifToJpeg => {
                self.can_decode_avif() && self.encoders.contains("mjpeg")
            }
        }
    }
}

async fn list_codecs(config: &ConverterConfig, flag: &str) -> BTreeSet<String> {
    let output = Command::new(&config.ffmpeg_path)
        .args(["-hide_banner", flag])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await;

    match output {
        Ok(o) if o.status.success() => parse_codec_listing(&String::from_utf8_lossy(&o.stdout)),
        _ => BTreeSet::new(),
    }
}

fn parse_codec_listing(listing: &str) -> BTreeSet<String> {
    let Some(re) = CODEC_LINE.as_ref() else {
        return BTreeSet::new();
    };
    listing
        .lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| name != "=")
        .collect()
}
