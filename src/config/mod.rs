//! Configuration module for Paperworm
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use paperworm::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Fetcher will retry {} times", config.fetcher.retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, CrawlMode, FetcherConfig, LedgerConfig, SelectorConfig, SpiderConfig,
};

// Re-export parser functions
pub use parser::load_config;
