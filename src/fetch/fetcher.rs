//! HTTP fetcher implementation
//!
//! This module performs all HTTP requests for the crawler, including:
//! - Randomized User-Agent selection per attempt
//! - Retry logic with exponential backoff for transient failures
//! - Charset-aware body decoding
//! - Optional archival of the decoded document

use crate::archive::ArchiveStore;
use crate::config::FetcherConfig;
use crate::fetch::decode::{charset_from_content_type, decode};
use rand::seq::SliceRandom;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Browser User-Agent pool sampled per attempt to avoid uniform blocking
const USER_AGENTS: [&str; 8] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.2365.66",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Mobile/15E148 Safari/604.1",
];

/// Picks a random User-Agent string from the built-in pool
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// A single logical retrieval request
///
/// Immutable; created per fetch. `category` and `file_name` override the
/// archive destination, `save_raw` controls whether the decoded document is
/// persisted at all.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Target URL
    pub url: String,

    /// Archive category bucket (e.g. a site or book label)
    pub category: Option<String>,

    /// Archive file name; defaults to a deterministic transform of the URL
    pub file_name: Option<String>,

    /// Whether to persist the decoded document
    pub save_raw: bool,
}

impl FetchRequest {
    /// Creates a request that archives under the default category
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: None,
            file_name: None,
            save_raw: true,
        }
    }

    /// Sets the archive category bucket
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets an explicit archive file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Disables archival for this request
    pub fn without_save(mut self) -> Self {
        self.save_raw = false;
        self
    }
}

/// Result of a fetch operation
///
/// Owned by the caller that issued the request; failures are values, not
/// errors, so one task's outcome never unwinds through its siblings.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The document was retrieved and decoded
    Success {
        /// Decoded document text
        text: String,
        /// Where the raw document was archived, when `save_raw` was set
        archive_path: Option<PathBuf>,
    },

    /// All attempts failed with retryable errors (network, timeout, bad status)
    TransientFailure {
        /// Description of the last failure
        reason: String,
        /// Last HTTP status observed, if the failure was status-based
        status: Option<u16>,
    },

    /// The request can never succeed (malformed URL)
    PermanentFailure {
        /// Description of the failure
        reason: String,
    },
}

impl FetchOutcome {
    /// Returns true for the `Success` variant
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds the shared HTTP client
///
/// The User-Agent is set per request, not here, because each attempt carries
/// a freshly randomized identity.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Stateless retrieval service: one logical fetch per call, retries inside
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
    archive: ArchiveStore,
}

impl Fetcher {
    /// Creates a fetcher from configuration and an archive store
    pub fn new(config: FetcherConfig, archive: ArchiveStore) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            archive,
        })
    }

    /// Backoff before retry attempt `attempt` (0-indexed): base * 2^attempt
    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.backoff_base_ms.saturating_mul(1u64 << attempt))
    }

    /// Performs one logical fetch with retries, decoding, and archival
    ///
    /// Retry policy: every transport error and every non-2xx status is
    /// treated as transient and retried up to `retries` times with
    /// `base * 2^attempt` backoff between attempts. Only a malformed URL is
    /// permanent. Exhausting retries yields `TransientFailure` carrying the
    /// last observed reason.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let url = match Url::parse(&request.url) {
            Ok(url) => url,
            Err(e) => {
                return FetchOutcome::PermanentFailure {
                    reason: format!("malformed URL '{}': {}", request.url, e),
                }
            }
        };

        let mut last_reason = String::new();
        let mut last_status: Option<u16> = None;

        for attempt in 0..self.config.retries {
            match self.attempt(&url).await {
                Ok(text) => {
                    let archive_path = if request.save_raw {
                        match self.save_origin(request, &text) {
                            Ok(path) => {
                                tracing::info!("Archived {} -> {}", request.url, path.display());
                                Some(path)
                            }
                            Err(e) => {
                                // Failing to archive means the fetch cannot be
                                // recorded as durable; surface it as transient
                                last_reason = format!("archive write failed: {}", e);
                                tracing::warn!("{} ({})", last_reason, request.url);
                                return FetchOutcome::TransientFailure {
                                    reason: last_reason,
                                    status: None,
                                };
                            }
                        }
                    } else {
                        None
                    };

                    return FetchOutcome::Success { text, archive_path };
                }
                Err(AttemptError::Status(status)) => {
                    last_reason = format!("HTTP {}", status);
                    last_status = Some(status);
                    tracing::warn!(
                        "HTTP {} for {} (attempt {}/{})",
                        status,
                        url,
                        attempt + 1,
                        self.config.retries
                    );
                }
                Err(AttemptError::Transport(e)) => {
                    last_reason = if e.is_timeout() {
                        "request timeout".to_string()
                    } else {
                        e.to_string()
                    };
                    last_status = None;
                    tracing::warn!(
                        "Request failed for {}: {} (attempt {}/{})",
                        url,
                        last_reason,
                        attempt + 1,
                        self.config.retries
                    );
                }
            }

            if attempt + 1 < self.config.retries {
                tokio::time::sleep(self.backoff_delay(attempt)).await;
            }
        }

        FetchOutcome::TransientFailure {
            reason: last_reason,
            status: last_status,
        }
    }

    /// Issues one GET attempt and decodes the body
    async fn attempt(&self, url: &Url) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let declared_charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let raw = response.bytes().await.map_err(AttemptError::Transport)?;

        Ok(decode(&raw, declared_charset.as_deref()))
    }

    /// Writes the decoded document into the archive
    fn save_origin(&self, request: &FetchRequest, text: &str) -> crate::Result<PathBuf> {
        let file_name = match &request.file_name {
            Some(name) => name.clone(),
            None => crate::archive::archive_filename(&request.url),
        };
        self.archive
            .write(request.category.as_deref(), &file_name, text)
    }
}

/// Internal classification of a single attempt's failure
enum AttemptError {
    Status(u16),
    Transport(reqwest::Error),
}
