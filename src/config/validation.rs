use crate::config::types::{Config, CrawlMode, FetcherConfig, SpiderConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_spider_config(&config.spider)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "retries must be >= 1, got {}",
            config.retries
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    let (min, max) = config.delay_range;
    if min < 0.0 || max < min {
        return Err(ConfigError::Validation(format!(
            "delay-range must satisfy 0 <= min <= max, got ({}, {})",
            min, max
        )));
    }

    Ok(())
}

/// Validates spider configuration
fn validate_spider_config(config: &SpiderConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "spider name cannot be empty".to_string(),
        ));
    }

    if config.max_items < 1 {
        return Err(ConfigError::Validation(format!(
            "max-items must be >= 1, got {}",
            config.max_items
        )));
    }

    match config.mode {
        CrawlMode::Chain => {
            let start = config.start_url.as_deref().ok_or_else(|| {
                ConfigError::Validation("chain mode requires spider.start-url".to_string())
            })?;
            validate_url(start)?;
        }
        CrawlMode::Batch => {
            if config.seeds.is_empty() {
                return Err(ConfigError::Validation(
                    "batch mode requires at least one entry in spider.seeds".to_string(),
                ));
            }
            for seed in &config.seeds {
                validate_url(seed)?;
            }
        }
    }

    Ok(())
}

/// Validates that a configured URL parses and uses http/https
fn validate_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::Validation(format!("invalid URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "URL '{}' must use http or https",
            raw
        )));
    }

    Ok(())
}
