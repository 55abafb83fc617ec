//! Batch frontier controller
//!
//! A batch crawl fans a fixed seed list out over the bounded worker pool.
//! Each URL is an independent unit: one fetch, one ledger row, no link
//! following. Failures are isolated per URL and rolled back in the visited
//! set so a later run can retry them.

use crate::crawler::extract::Extractor;
use crate::crawler::pool::run_tasks;
use crate::crawler::Shutdown;
use crate::fetch::{FetchOutcome, FetchRequest, Fetcher};
use crate::ledger::{FileLedger, LedgerRecord, OutcomeStatus};
use crate::state::VisitedSet;
use std::sync::{Arc, Mutex};

/// Per-URL outcome of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// Fetched and recorded in this run
    Fetched,

    /// Already visited, no network call made
    Skipped,

    /// Fetch failed after retries; eligible for retry on a later run
    Failed,
}

/// Result entry for one seed URL
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub url: String,
    pub status: BatchStatus,
    pub archive_path: Option<String>,
}

/// Frontier controller for fixed seed lists
pub struct BatchCrawler {
    fetcher: Arc<Fetcher>,
    ledger: Arc<Mutex<FileLedger>>,
    visited: VisitedSet,
    extractor: Arc<dyn Extractor>,
    category: String,
    concurrency: usize,
    delay_range: (f64, f64),
    shutdown: Shutdown,
}

impl BatchCrawler {
    /// Creates a batch crawler over shared fetch/ledger/visited state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Arc<Fetcher>,
        ledger: Arc<Mutex<FileLedger>>,
        visited: VisitedSet,
        extractor: Arc<dyn Extractor>,
        category: impl Into<String>,
        concurrency: usize,
        delay_range: (f64, f64),
        shutdown: Shutdown,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            visited,
            extractor,
            category: category.into(),
            concurrency,
            delay_range,
            shutdown,
        }
    }

    /// Fetches every seed URL through the bounded pool
    ///
    /// Exactly one ledger row is appended per attempted URL. Already-visited
    /// URLs are skipped without a network call or a duplicate row. Results
    /// arrive in completion order, not seed order.
    pub async fn run(&self, urls: Vec<String>) -> Vec<BatchResult> {
        let fetcher = Arc::clone(&self.fetcher);
        let ledger = Arc::clone(&self.ledger);
        let visited = self.visited.clone();
        let extractor = Arc::clone(&self.extractor);
        let category = self.category.clone();
        let shutdown = self.shutdown.clone();

        tracing::info!("Starting batch of {} seed URLs", urls.len());

        let worker = move |url: String| {
            let fetcher = Arc::clone(&fetcher);
            let ledger = Arc::clone(&ledger);
            let visited = visited.clone();
            let extractor = Arc::clone(&extractor);
            let category = category.clone();
            let shutdown = shutdown.clone();

            async move {
                if shutdown.is_triggered() {
                    return Ok(None);
                }

                // Atomic check-and-insert; losing the race means another
                // worker (or a previous run) owns this URL.
                if !visited.try_mark_visited(&url) {
                    tracing::debug!("Skipping already-visited URL: {}", url);
                    return Ok(Some(BatchResult {
                        url,
                        status: BatchStatus::Skipped,
                        archive_path: None,
                    }));
                }

                let request = FetchRequest::new(&url).with_category(&category);
                match fetcher.fetch(&request).await {
                    FetchOutcome::Success { text, archive_path } => {
                        let mut record = LedgerRecord::now(&url, OutcomeStatus::Success);
                        if let Some(path) = &archive_path {
                            record = record.with_source_file(path.display().to_string());
                        }
                        if let Some(content) = extractor.content(&text) {
                            if let Some(book) = content.book {
                                record = record.with_book(book);
                            }
                            if let Some(title) = content.title {
                                record = record.with_chapter(title);
                            }
                        }
                        ledger.lock().unwrap().append(&record)?;

                        Ok(Some(BatchResult {
                            url,
                            status: BatchStatus::Fetched,
                            archive_path: archive_path.map(|p| p.display().to_string()),
                        }))
                    }
                    FetchOutcome::TransientFailure { reason, status } => {
                        tracing::error!(
                            "Fetch failed for {}: {} (status {:?})",
                            url,
                            reason,
                            status
                        );
                        ledger
                            .lock()
                            .unwrap()
                            .append(&LedgerRecord::now(&url, OutcomeStatus::Failed))?;
                        visited.unmark(&url);

                        Ok(Some(BatchResult {
                            url,
                            status: BatchStatus::Failed,
                            archive_path: None,
                        }))
                    }
                    FetchOutcome::PermanentFailure { reason } => {
                        tracing::error!("Unrecoverable fetch for {}: {}", url, reason);
                        ledger
                            .lock()
                            .unwrap()
                            .append(&LedgerRecord::now(&url, OutcomeStatus::Failed))?;
                        visited.unmark(&url);

                        Ok(Some(BatchResult {
                            url,
                            status: BatchStatus::Failed,
                            archive_path: None,
                        }))
                    }
                }
            }
        };

        let results = run_tasks(urls, worker, self.concurrency, self.delay_range).await;

        let fetched = results
            .iter()
            .filter(|r| r.status == BatchStatus::Fetched)
            .count();
        tracing::info!("Batch finished: {} fetched, {} total", fetched, results.len());

        results
    }
}
