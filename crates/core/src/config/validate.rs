use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Conversion settings are within encoder ranges
/// - ffmpeg path and AVIF encoder are not empty
/// - Worker channel capacities are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .conversion
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.converter.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.ffmpeg_path cannot be empty".to_string(),
        ));
    }
    if config.converter.avif_encoder.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.avif_encoder cannot be empty".to_string(),
        ));
    }

    if config.worker.command_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "worker.command_buffer cannot be 0".to_string(),
        ));
    }
    if config.worker.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "worker.event_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
