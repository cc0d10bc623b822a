use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Metadata API key and operator search credentials are present
/// - Refresh target count and interval are non-zero
/// - Provider request timeouts are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Secrets are required at startup
    let mut missing = Vec::new();
    if config.metadata.api_key.trim().is_empty() {
        missing.push("STASHDB_API_KEY (metadata.api_key)");
    }
    if config.file_search.username.trim().is_empty() {
        missing.push("EASYNEWS_USERNAME (file_search.username)");
    }
    if config.file_search.password.is_empty() {
        missing.push("EASYNEWS_PASSWORD (file_search.password)");
    }
    if !missing.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "missing required settings: {}",
            missing.join(", ")
        )));
    }

    if config.refresh.target_count == 0 {
        return Err(ConfigError::ValidationError(
            "refresh.target_count must be at least 1".to_string(),
        ));
    }

    if config.refresh.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "refresh.interval_secs must be at least 1".to_string(),
        ));
    }

    if config.metadata.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "metadata.timeout_secs must be at least 1".to_string(),
        ));
    }

    if config.file_search.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "file_search.timeout_secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}
