//! Fetch module: HTTP retrieval and content decoding
//!
//! This module contains:
//! - Charset detection and byte-to-text decoding
//! - The retrying HTTP fetcher with randomized request identity and
//!   exponential backoff
//! - Archival of fetched documents via the archive store

mod decode;
mod fetcher;

pub use decode::{charset_from_content_type, decode, sniff_meta_charset};
pub use fetcher::{build_http_client, random_user_agent, FetchOutcome, FetchRequest, Fetcher};
