//! Crawl orchestration
//!
//! Wires the fetcher, ledger, visited set, and extraction collaborator into
//! the two frontier shapes: a next-link chain or a fixed seed batch. The
//! bounded task pool and the selector-driven extractor live in their own
//! submodules.

pub mod batch;
pub mod chain;
pub mod extract;
pub mod pool;

pub use batch::{BatchCrawler, BatchResult, BatchStatus};
pub use chain::{ChainCrawler, ChainEnd, ChainReport};
pub use extract::{ExtractedContent, Extractor, SelectorExtractor};
pub use pool::{random_delay, run_tasks};

use crate::archive::ArchiveStore;
use crate::config::{Config, CrawlMode};
use crate::fetch::Fetcher;
use crate::ledger::FileLedger;
use crate::state::VisitedSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Cooperative shutdown flag shared across crawl tasks
///
/// Cloned handles observe the same flag. Triggering stops controllers at the
/// next step boundary; in-flight fetches finish or are dropped with the
/// runtime, which is safe because the ledger is append-only.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop at the next step boundary
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Spawns a task that trips the flag on ctrl-c
    pub fn listen_for_ctrl_c(&self) {
        let handle = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing current step");
                handle.trigger();
            }
        });
    }
}

/// Runs the configured spider to completion
///
/// Builds the shared components from config, restores the visited set from
/// the ledger, and dispatches on crawl mode. Returns after the frontier is
/// exhausted, the item limit is hit, or an interrupt is observed.
pub async fn run_spider(config: &Config, shutdown: Shutdown) -> crate::Result<()> {
    let ledger = FileLedger::new(&config.ledger.path);
    let visited = VisitedSet::from_urls(ledger.visited_urls()?);
    tracing::info!(
        "Ledger {} holds {} completed URLs",
        config.ledger.path,
        visited.len()
    );

    let archive = ArchiveStore::new(&config.archive.root, &config.archive.category);
    let fetcher = Arc::new(Fetcher::new(config.fetcher.clone(), archive)?);
    let extractor = Arc::new(SelectorExtractor::new(&config.spider.selectors)?);
    let ledger = Arc::new(Mutex::new(ledger));

    // The spider name buckets its raw documents under the archive root.
    let category = config.spider.name.clone();

    match config.spider.mode {
        CrawlMode::Chain => {
            let start_url = config.spider.start_url.as_deref().ok_or_else(|| {
                crate::ConfigError::Validation(
                    "Chain mode requires spider.start-url".to_string(),
                )
            })?;

            let crawler = ChainCrawler::new(
                fetcher,
                ledger,
                visited,
                extractor,
                category,
                config.fetcher.delay_range,
                shutdown,
            );
            let report = crawler.run(start_url, config.spider.max_items).await?;
            tracing::info!(
                "Spider '{}' done: {} items fetched ({:?})",
                config.spider.name,
                report.fetched,
                report.end
            );
        }
        CrawlMode::Batch => {
            let crawler = BatchCrawler::new(
                fetcher,
                ledger,
                visited,
                extractor,
                category,
                config.fetcher.concurrency as usize,
                config.fetcher.delay_range,
                shutdown,
            );
            let results = crawler.run(config.spider.seeds.clone()).await;
            let fetched = results
                .iter()
                .filter(|r| r.status == BatchStatus::Fetched)
                .count();
            let failed = results
                .iter()
                .filter(|r| r.status == BatchStatus::Failed)
                .count();
            tracing::info!(
                "Spider '{}' done: {} fetched, {} failed, {} seeds",
                config.spider.name,
                fetched,
                failed,
                config.spider.seeds.len()
            );
        }
    }

    Ok(())
}
