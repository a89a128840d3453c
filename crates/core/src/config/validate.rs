use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Resolver has at least one worker
/// - Cache freshness window and probe timeout are non-zero
/// - Dedup window is non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.resolver.workers == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.workers cannot be 0".to_string(),
        ));
    }

    if config.availability.max_age_months == 0 {
        return Err(ConfigError::ValidationError(
            "availability.max_age_months cannot be 0".to_string(),
        ));
    }

    if config.availability.probe_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "availability.probe_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.pipeline.window_size == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.window_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
