use serde::{Deserialize, Serialize};

use crate::converter::{ConversionSettings, ConverterConfig};
use crate::worker::WorkerConfig;

/// Root configuration
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// ffmpeg binary and encoder selection.
    #[serde(default)]
    pub converter: ConverterConfig,
    /// Encoder parameters for new jobs.
    #[serde(default)]
    pub conversion: ConversionSettings,
    /// Worker channel sizes and matching rules.
    #[serde(default)]
    pub worker: WorkerConfig,
}
