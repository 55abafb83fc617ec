//! Concurrency-safe set of already-processed URLs

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// The in-memory set of URLs with a recorded successful fetch
///
/// Cloning shares the underlying set, so every worker gates on the same
/// state. The check-and-insert is atomic: two workers racing on the same URL
/// cannot both win `try_mark_visited`, which closes the gap between "check
/// visited" and "dispatch fetch".
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from ledger success URLs at startup
    pub fn from_urls(urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(urls.into_iter().collect())),
        }
    }

    /// Returns true if the URL is already marked visited
    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().unwrap().contains(url)
    }

    /// Atomically marks a URL visited
    ///
    /// Returns true if this caller inserted the mark, false if the URL was
    /// already visited. Exactly one of any set of racing callers wins.
    pub fn try_mark_visited(&self, url: &str) -> bool {
        self.inner.lock().unwrap().insert(url.to_string())
    }

    /// Removes a mark, e.g. when a fetch failed after marking or when resume
    /// rolls back the last recorded URL
    pub fn unmark(&self, url: &str) {
        self.inner.lock().unwrap().remove(url);
    }

    /// Number of visited URLs
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Returns true if no URL is marked visited
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
