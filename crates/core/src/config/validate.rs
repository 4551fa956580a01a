use super::{types::Config, ConfigError};

/// Speed presets understood by libx265.
const X265_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

/// Validate configuration
/// Currently validates:
/// - CRF is within the x265 range and the preset is an x265 preset
/// - Compression ratio threshold is in (0, 1]
/// - Directories are set and timeouts are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.compression_crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "compression_crf must be between 0 and 51, got {}",
            config.compression_crf
        )));
    }

    if !X265_PRESETS.contains(&config.compression_preset.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "compression_preset '{}' is not an x265 preset",
            config.compression_preset
        )));
    }

    let ratio = config.min_compression_ratio;
    if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
        return Err(ConfigError::ValidationError(format!(
            "min_compression_ratio must be in (0, 1], got {}",
            ratio
        )));
    }

    for (name, dir) in [
        ("downloads_dir", &config.downloads_dir),
        ("movies_dir", &config.movies_dir),
        ("shows_dir", &config.shows_dir),
        ("lock_file", &config.lock_file),
    ] {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                name
            )));
        }
    }

    if config.engine.probe_timeout_secs == 0 || config.engine.transcode_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine timeouts cannot be 0".to_string(),
        ));
    }

    let tolerance = config.verify.duration_tolerance_secs;
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "verify.duration_tolerance_secs must be >= 0, got {}",
            tolerance
        )));
    }

    if config.verify.decode_sample_secs == 0 {
        return Err(ConfigError::ValidationError(
            "verify.decode_sample_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
