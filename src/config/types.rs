use serde::Deserialize;

/// Main configuration structure for Paperworm
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    pub spider: SpiderConfig,
}

/// Fetcher behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Maximum number of attempts per fetch
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Per-attempt request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base duration of the exponential backoff in milliseconds
    /// (attempt n waits base * 2^n)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Random per-request delay range in seconds, drawn uniformly
    #[serde(rename = "delay-range", default = "default_delay_range")]
    pub delay_range: (f64, f64),

    /// Number of concurrent workers in the task pool
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            timeout_secs: default_timeout_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            delay_range: default_delay_range(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_delay_range() -> (f64, f64) {
    (1.0, 3.0)
}

fn default_concurrency() -> u32 {
    5
}

/// Raw document archive configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory for raw fetched documents
    #[serde(default = "default_archive_root")]
    pub root: String,

    /// Category bucket used when a task supplies none
    #[serde(default = "default_category")]
    pub category: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: default_archive_root(),
            category: default_category(),
        }
    }
}

fn default_archive_root() -> String {
    "origin".to_string()
}

fn default_category() -> String {
    "common".to_string()
}

/// Checkpoint ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Path to the CSV ledger file
    #[serde(default = "default_ledger_path")]
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

fn default_ledger_path() -> String {
    "crawl_log.csv".to_string()
}

/// Crawl shape: a fixed seed list or a self-extending next-link chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    Chain,
    Batch,
}

/// Spider configuration: what to crawl and how to extract from it
#[derive(Debug, Clone, Deserialize)]
pub struct SpiderConfig {
    /// Name of the spider (used as the default archive category)
    pub name: String,

    /// Crawl mode
    pub mode: CrawlMode,

    /// Starting URL for chain mode
    #[serde(rename = "start-url")]
    pub start_url: Option<String>,

    /// Seed URLs for batch mode
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Maximum number of items to fetch
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: usize,

    /// CSS selectors driving the extraction collaborator
    #[serde(default)]
    pub selectors: SelectorConfig,
}

fn default_max_items() -> usize {
    50
}

/// CSS selectors for the built-in selector-driven extractor
///
/// The selector values are site configuration, never code; the core only
/// knows that a next-link selector yields an anchor and the rest yield text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorConfig {
    /// Selector for the anchor pointing at the next page in a chain
    #[serde(rename = "next-link")]
    pub next_link: Option<String>,

    /// Selector for the item title
    pub title: Option<String>,

    /// Selector for the item body text
    pub content: Option<String>,

    /// Selector for the book label attached to ledger records
    pub book: Option<String>,
}
