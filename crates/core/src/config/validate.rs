use super::{types::Config, ConfigError};
use crate::dispatch::parse_mac;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - CRF is within the 0-51 range accepted by x264/x265
/// - Segment duration is not 0
/// - Remote target has at least one attempt and a well-formed MAC address
/// - At least one directly playable extension is configured
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.transcode.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "transcode.crf must be between 0 and 51, got {}",
            config.transcode.crf
        )));
    }

    if config.transcode.segment_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcode.segment_secs cannot be 0".to_string(),
        ));
    }

    if config.playback.playable_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "playback.playable_extensions cannot be empty".to_string(),
        ));
    }

    if let Some(remote) = &config.remote {
        if remote.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "remote.max_attempts cannot be 0".to_string(),
            ));
        }

        parse_mac(&remote.mac_address).map_err(|e| {
            ConfigError::ValidationError(format!("remote.mac_address: {}", e))
        })?;
    }

    Ok(())
}
