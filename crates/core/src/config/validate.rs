use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Storage bucket is set
/// - Source URL is http(s)
/// - Page size is within the WordPress limit (1..=100)
/// - Consecutive failure ceiling is at least 1
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.storage.bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.bucket cannot be empty".to_string(),
        ));
    }

    if !(config.source.url.starts_with("http://") || config.source.url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "source.url must be an http(s) URL, got {:?}",
            config.source.url
        )));
    }

    if config.source.per_page == 0 || config.source.per_page > 100 {
        return Err(ConfigError::ValidationError(format!(
            "source.per_page must be between 1 and 100, got {}",
            config.source.per_page
        )));
    }

    if config.source.max_consecutive_failures == 0 {
        return Err(ConfigError::ValidationError(
            "source.max_consecutive_failures must be at least 1".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
