//! Paperworm: a resilient fetch-and-archive crawl engine
//!
//! This crate implements a restartable crawler core: a retrying HTTP fetcher
//! with charset normalization, a bounded worker pool with per-task failure
//! isolation, and a durable checkpoint ledger that makes crawls idempotent
//! across process restarts.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod fetch;
pub mod ledger;
pub mod state;

use thiserror::Error;

/// Main error type for Paperworm operations
#[derive(Debug, Error)]
pub enum PaperwormError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Archive write failed at {path}: {source}")]
    Archive {
        path: String,
        source: std::io::Error,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Paperworm operations
pub type Result<T> = std::result::Result<T, PaperwormError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{FetchOutcome, FetchRequest, Fetcher};
pub use ledger::{FileLedger, LedgerRecord, OutcomeStatus};
pub use state::VisitedSet;
