use crate::config::types::{CatalogConfig, Config, FetchConfig, OutputConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound for either end of the delay range, in seconds
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Validates the entire configuration
///
/// Invalid configuration is the only setup-time fatal error: everything that
/// goes wrong later is isolated per URL.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_fetch_config(&config.fetch)?;
    validate_catalog_config(&config.catalog)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates retry and pacing configuration
///
/// Also run by the fetcher on construction, so a configuration built in code
/// is held to the same rules as one loaded from a file.
pub fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    let (min, max) = config.delay_range();
    if !min.is_finite() || !max.is_finite() || min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay range must be finite and non-negative, got ({}, {})",
            min, max
        )));
    }

    if max > MAX_DELAY_SECS {
        return Err(ConfigError::Validation(format!(
            "delay_max_secs ({}) must be <= {}",
            max, MAX_DELAY_SECS
        )));
    }

    if max < min {
        return Err(ConfigError::Validation(format!(
            "delay_max_secs ({}) must be >= delay_min_secs ({})",
            max, min
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_consecutive_blocks == Some(0) {
        return Err(ConfigError::Validation(
            "max_consecutive_blocks must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the catalog base URL
fn validate_catalog_config(config: &CatalogConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    Ok(())
}
