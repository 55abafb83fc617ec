//! Integration tests for chain-mode crawls against a mock HTTP server

use paperworm::archive::ArchiveStore;
use paperworm::config::{FetcherConfig, SelectorConfig};
use paperworm::crawler::{ChainCrawler, ChainEnd, Extractor, SelectorExtractor, Shutdown};
use paperworm::fetch::Fetcher;
use paperworm::ledger::{FileLedger, LedgerRecord, OutcomeStatus};
use paperworm::state::VisitedSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(title: &str, next_href: Option<&str>) -> String {
    let next = next_href
        .map(|href| format!("<a class=\"next\" href=\"{}\">next</a>", href))
        .unwrap_or_default();
    format!(
        "<html><body><h1>{}</h1><div class=\"content\">body of {}</div>{}</body></html>",
        title, title, next
    )
}

fn extractor() -> Arc<dyn Extractor> {
    let selectors = SelectorConfig {
        next_link: Some("a.next".to_string()),
        title: Some("h1".to_string()),
        content: Some("div.content".to_string()),
        book: None,
    };
    Arc::new(SelectorExtractor::new(&selectors).unwrap())
}

fn chain_crawler(dir: &TempDir, visited: VisitedSet, retries: u32) -> ChainCrawler {
    let config = FetcherConfig {
        retries,
        timeout_secs: 5,
        backoff_base_ms: 10,
        delay_range: (0.0, 0.0),
        concurrency: 1,
    };
    let archive = ArchiveStore::new(dir.path().join("origin"), "common");
    let fetcher = Arc::new(Fetcher::new(config, archive).unwrap());
    let ledger = Arc::new(Mutex::new(FileLedger::new(dir.path().join("crawl_log.csv"))));

    ChainCrawler::new(
        fetcher,
        ledger,
        visited,
        extractor(),
        "novel",
        (0.0, 0.0),
        Shutdown::new(),
    )
}

fn ledger_records(dir: &TempDir) -> Vec<LedgerRecord> {
    FileLedger::new(dir.path().join("crawl_log.csv"))
        .load()
        .unwrap()
}

#[tokio::test]
async fn test_chain_follows_next_links_to_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 1", Some("/b"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 2", None)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = chain_crawler(&dir, VisitedSet::new(), 2);

    let report = crawler.run(&format!("{}/a", server.uri()), 10).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.end, ChainEnd::NoNextLink);

    let records = ledger_records(&dir);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == OutcomeStatus::Success));
    assert_eq!(records[0].url, format!("{}/a", server.uri()));
    assert_eq!(records[1].url, format!("{}/b", server.uri()));
    assert_eq!(records[0].chapter_name, "Chapter 1");
    assert_eq!(records[1].chapter_name, "Chapter 2");
    assert!(!records[0].source_file.is_empty());
    assert!(std::path::Path::new(&records[0].source_file).exists());
}

#[tokio::test]
async fn test_chain_stops_at_item_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 1", Some("/b"))))
        .mount(&server)
        .await;
    // /b must never be requested once the limit is hit
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 2", None)))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = chain_crawler(&dir, VisitedSet::new(), 2);

    let report = crawler.run(&format!("{}/a", server.uri()), 1).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.end, ChainEnd::LimitReached);
    assert_eq!(ledger_records(&dir).len(), 1);
}

#[tokio::test]
async fn test_chain_resume_refetches_last_recorded_url() {
    let server = MockServer::start().await;
    let url_a = format!("{}/a", server.uri());
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 1", Some("/b"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 2", None)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();

    // Previous run recorded /a; its row is discarded and /a is refetched to
    // recover the chain continuation.
    let ledger = FileLedger::new(dir.path().join("crawl_log.csv"));
    ledger
        .append(&LedgerRecord::now(&url_a, OutcomeStatus::Success))
        .unwrap();
    let visited = VisitedSet::from_urls(ledger.visited_urls().unwrap());

    let crawler = chain_crawler(&dir, visited, 2);
    let report = crawler.run(&url_a, 10).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.end, ChainEnd::NoNextLink);

    let records = ledger_records(&dir);
    assert_eq!(records.len(), 2);
    let rows_for_a = records.iter().filter(|r| r.url == url_a).count();
    assert_eq!(rows_for_a, 1);
}

#[tokio::test]
async fn test_chain_records_failure_and_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = chain_crawler(&dir, VisitedSet::new(), 1);

    let report = crawler.run(&format!("{}/a", server.uri()), 10).await.unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.end, ChainEnd::FetchFailed);

    let records = ledger_records(&dir);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, OutcomeStatus::Failed);
}

#[tokio::test]
async fn test_chain_detects_cycles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 1", Some("/b"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 2", Some("/a"))))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = chain_crawler(&dir, VisitedSet::new(), 2);

    let report = crawler.run(&format!("{}/a", server.uri()), 10).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.end, ChainEnd::LoopDetected);
}

#[tokio::test]
async fn test_chain_interrupt_stops_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Chapter 1", None)))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = FetcherConfig {
        retries: 2,
        timeout_secs: 5,
        backoff_base_ms: 10,
        delay_range: (0.0, 0.0),
        concurrency: 1,
    };
    let archive = ArchiveStore::new(dir.path().join("origin"), "common");
    let fetcher = Arc::new(Fetcher::new(config, archive).unwrap());
    let ledger = Arc::new(Mutex::new(FileLedger::new(dir.path().join("crawl_log.csv"))));

    let shutdown = Shutdown::new();
    shutdown.trigger();

    let crawler = ChainCrawler::new(
        fetcher,
        ledger,
        VisitedSet::new(),
        extractor(),
        "novel",
        (0.0, 0.0),
        shutdown,
    );

    let report = crawler.run(&format!("{}/a", server.uri()), 10).await.unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.end, ChainEnd::Interrupted);
    assert!(ledger_records(&dir).is_empty());
}
