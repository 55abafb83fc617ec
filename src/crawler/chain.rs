//! Chain-following frontier controller
//!
//! A chain crawl holds a single current URL; each fetched document yields at
//! most one next URL. The controller is a two-state machine: it keeps
//! advancing until no next link is found, the item limit is reached, a fetch
//! fails, a cycle is detected, or an interrupt is requested.
//!
//! On resume the last recorded URL may represent a partially completed unit,
//! so its ledger rows are discarded and it is refetched before the chain
//! continues forward. One redundant fetch buys correctness against partial
//! writes. Rollback is per-row: a logical unit spanning multiple pages is not
//! rolled back as a whole.

use crate::crawler::extract::Extractor;
use crate::crawler::pool::random_delay;
use crate::crawler::Shutdown;
use crate::fetch::{FetchOutcome, FetchRequest, Fetcher};
use crate::ledger::{FileLedger, LedgerRecord, OutcomeStatus};
use crate::state::VisitedSet;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Why a chain crawl reached its terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEnd {
    /// The last document linked no next page
    NoNextLink,

    /// The configured maximum item count was reached
    LimitReached,

    /// A fetch failed after exhausting retries (logged and recorded, not raised)
    FetchFailed,

    /// The chain revisited a URL already seen in this run
    LoopDetected,

    /// A shutdown was requested between steps
    Interrupted,
}

/// Summary of a finished chain crawl
#[derive(Debug)]
pub struct ChainReport {
    /// Number of items fetched and recorded in this run
    pub fetched: usize,

    /// Terminal reason
    pub end: ChainEnd,
}

/// Frontier controller for chain-following crawls
pub struct ChainCrawler {
    fetcher: Arc<Fetcher>,
    ledger: Arc<Mutex<FileLedger>>,
    visited: VisitedSet,
    extractor: Arc<dyn Extractor>,
    category: String,
    delay_range: (f64, f64),
    shutdown: Shutdown,
}

impl ChainCrawler {
    /// Creates a chain crawler over shared fetch/ledger/visited state
    pub fn new(
        fetcher: Arc<Fetcher>,
        ledger: Arc<Mutex<FileLedger>>,
        visited: VisitedSet,
        extractor: Arc<dyn Extractor>,
        category: impl Into<String>,
        delay_range: (f64, f64),
        shutdown: Shutdown,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            visited,
            extractor,
            category: category.into(),
            delay_range,
            shutdown,
        }
    }

    /// Walks the chain from `start_url` (or the resume point) up to
    /// `max_items` fetched items
    ///
    /// Fetch failures end the chain but are not errors; only ledger I/O
    /// failures propagate, because an unwritable ledger would silently break
    /// resumability.
    pub async fn run(&self, start_url: &str, max_items: usize) -> crate::Result<ChainReport> {
        let mut current = self.resume_point(start_url)?;
        let mut fetched = 0usize;
        let mut seen_this_run: HashSet<String> = HashSet::new();

        let end = loop {
            if self.shutdown.is_triggered() {
                tracing::warn!("Interrupt requested, stopping chain before {}", current);
                break ChainEnd::Interrupted;
            }

            if fetched >= max_items {
                break ChainEnd::LimitReached;
            }

            if !seen_this_run.insert(current.clone()) {
                tracing::warn!("Chain looped back to {}, stopping", current);
                break ChainEnd::LoopDetected;
            }

            random_delay(self.delay_range).await;

            tracing::info!("Fetching chain item: {}", current);
            let request = FetchRequest::new(&current).with_category(&self.category);

            match self.fetcher.fetch(&request).await {
                FetchOutcome::Success { text, archive_path } => {
                    // A URL visited in a previous run is refetched only to
                    // recover the chain continuation; no duplicate row.
                    if self.visited.contains(&current) {
                        tracing::debug!("{} already recorded, not appending", current);
                    } else {
                        let mut record = LedgerRecord::now(&current, OutcomeStatus::Success);
                        if let Some(path) = &archive_path {
                            record = record.with_source_file(path.display().to_string());
                        }

                        match self.extractor.content(&text) {
                            Some(content) => {
                                if let Some(book) = content.book {
                                    record = record.with_book(book);
                                }
                                if let Some(title) = content.title {
                                    record = record.with_chapter(title);
                                }
                            }
                            None => {
                                // Archival success and extraction success are
                                // independent facts; the fetch still counts.
                                tracing::warn!("Extraction yielded nothing for {}", current);
                            }
                        }

                        self.append(&record)?;
                        self.visited.try_mark_visited(&current);
                        fetched += 1;
                    }

                    match self.extractor.next_link(&text, &current) {
                        Some(next) => {
                            tracing::debug!("Next chain link: {}", next);
                            current = next;
                        }
                        None => {
                            tracing::info!("No next link after {}, chain complete", current);
                            break ChainEnd::NoNextLink;
                        }
                    }
                }
                FetchOutcome::TransientFailure { reason, status } => {
                    tracing::error!(
                        "Fetch failed for {}: {} (status {:?})",
                        current,
                        reason,
                        status
                    );
                    self.append(&LedgerRecord::now(&current, OutcomeStatus::Failed))?;
                    break ChainEnd::FetchFailed;
                }
                FetchOutcome::PermanentFailure { reason } => {
                    tracing::error!("Unrecoverable fetch for {}: {}", current, reason);
                    self.append(&LedgerRecord::now(&current, OutcomeStatus::Failed))?;
                    break ChainEnd::FetchFailed;
                }
            }
        };

        tracing::info!("Chain finished: {} items, {:?}", fetched, end);
        Ok(ChainReport { fetched, end })
    }

    /// Determines where the chain starts, rolling back the last recorded URL
    ///
    /// When the ledger already holds progress, the last recorded URL is
    /// discarded (it may be a partially completed unit) and becomes the
    /// resume point; otherwise the crawl starts at `start_url`.
    fn resume_point(&self, start_url: &str) -> crate::Result<String> {
        if self.visited.is_empty() {
            return Ok(start_url.to_string());
        }

        let ledger = self.ledger.lock().unwrap();
        match ledger.last_entry_url()? {
            Some(last) => {
                tracing::info!("Resuming chain: discarding and refetching {}", last);
                ledger.remove_by_url(&last)?;
                self.visited.unmark(&last);
                Ok(last)
            }
            None => Ok(start_url.to_string()),
        }
    }

    fn append(&self, record: &LedgerRecord) -> crate::Result<()> {
        self.ledger.lock().unwrap().append(record)?;
        Ok(())
    }
}
