use crate::config::types::{ClientConfig, Config, CrawlerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates API client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.backoff_base_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms must be >= 1, got {}",
            config.backoff_base_ms
        )));
    }

    if config.backoff_base_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) cannot exceed max_backoff_ms ({})",
            config.backoff_base_ms, config.max_backoff_ms
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.thread_depth > 1000 {
        return Err(ConfigError::Validation(format!(
            "thread_depth must be between 0 and 1000, got {}",
            config.thread_depth
        )));
    }

    if config.parent_height > 1000 {
        return Err(ConfigError::Validation(format!(
            "parent_height must be between 0 and 1000, got {}",
            config.parent_height
        )));
    }

    if config.quotes_page_limit < 1 || config.quotes_page_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "quotes_page_limit must be between 1 and 100, got {}",
            config.quotes_page_limit
        )));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 64, got {}",
            config.max_concurrent_requests
        )));
    }

    // quote_threshold = 0 would queue every post; max_quote_depth = 0 disables
    // the recursive crawl. Both are allowed.
    Ok(())
}

/// Validates the API base URL
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            base_url
        )));
    }

    Ok(())
}
