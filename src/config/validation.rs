use crate::config::types::{CatalogConfig, Config, FetcherConfig, OutputConfig, PipelineConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_output_config(&config.output)?;
    validate_catalog_config(&config.catalog)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 100 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 100, got {}",
            config.max_attempts
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the concurrency ceiling
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 500 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 500, got {}",
            config.max_concurrent_requests
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the emulator list
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.emulators.is_empty() && !config.discover_emulators {
        return Err(ConfigError::Validation(
            "catalog needs at least one emulator or discover-emulators = true".to_string(),
        ));
    }

    if config.max_pages < 1 || config.max_pages > 100_000 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be between 1 and 100000, got {}",
            config.max_pages
        )));
    }

    for emulator in &config.emulators {
        validate_emulator_slug(emulator)?;
    }

    Ok(())
}

/// Emulator slugs become URL path segments, so keep them to a safe alphabet
fn validate_emulator_slug(slug: &str) -> Result<(), ConfigError> {
    if slug.is_empty() {
        return Err(ConfigError::Validation(
            "emulator name cannot be empty".to_string(),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "emulator '{}' may only contain letters, digits, '-' and '_'",
            slug
        )));
    }

    Ok(())
}
