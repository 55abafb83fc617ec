//! Integration tests for fetch retries, decoding, and archival

use paperworm::archive::ArchiveStore;
use paperworm::config::FetcherConfig;
use paperworm::fetch::{FetchOutcome, FetchRequest, Fetcher};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(dir: &TempDir, retries: u32) -> Fetcher {
    let config = FetcherConfig {
        retries,
        timeout_secs: 5,
        backoff_base_ms: 10,
        delay_range: (0.0, 0.0),
        concurrency: 1,
    };
    let archive = ArchiveStore::new(dir.path().join("origin"), "common");
    Fetcher::new(config, archive).unwrap()
}

#[tokio::test]
async fn test_retry_recovers_from_transient_error() {
    let server = MockServer::start().await;

    // First attempt fails, second succeeds.
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>recovered</html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let outcome = fetcher(&dir, 3)
        .fetch(&FetchRequest::new(format!("{}/flaky", server.uri())))
        .await;

    match outcome {
        FetchOutcome::Success { text, archive_path } => {
            assert!(text.contains("recovered"));
            let path = archive_path.expect("archival enabled by default");
            assert_eq!(std::fs::read_to_string(path).unwrap(), text);
        }
        other => panic!("expected success after retry, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exhausted_retries_report_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let outcome = fetcher(&dir, 3)
        .fetch(&FetchRequest::new(format!("{}/broken", server.uri())))
        .await;

    match outcome {
        FetchOutcome::TransientFailure { reason, status } => {
            assert_eq!(status, Some(500));
            assert!(reason.contains("500"));
        }
        other => panic!("expected transient failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gbk_body_decoded_via_content_type_header() {
    let server = MockServer::start().await;

    // "中文" encoded as GBK.
    let gbk_body: &[u8] = &[0xD6, 0xD0, 0xCE, 0xC4];
    Mock::given(method("GET"))
        .and(path("/gbk"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gbk_body)
                .insert_header("content-type", "text/html; charset=gbk"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let outcome = fetcher(&dir, 2)
        .fetch(&FetchRequest::new(format!("{}/gbk", server.uri())))
        .await;

    match outcome {
        FetchOutcome::Success { text, .. } => assert_eq!(text, "中文"),
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_meta_charset_decoded_without_header() {
    let server = MockServer::start().await;

    // "你好" as GBK inside a page declaring its charset only in a meta tag.
    let mut body = b"<html><head><meta charset=\"gbk\"></head><body>".to_vec();
    body.extend_from_slice(&[0xC4, 0xE3, 0xBA, 0xC3]);
    body.extend_from_slice(b"</body></html>");
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let outcome = fetcher(&dir, 2)
        .fetch(&FetchRequest::new(format!("{}/meta", server.uri())))
        .await;

    match outcome {
        FetchOutcome::Success { text, .. } => assert!(text.contains("你好")),
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_without_save_skips_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ephemeral</html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let outcome = fetcher(&dir, 2)
        .fetch(&FetchRequest::new(format!("{}/page", server.uri())).without_save())
        .await;

    match outcome {
        FetchOutcome::Success { archive_path, .. } => assert!(archive_path.is_none()),
        other => panic!("expected success, got {:?}", other),
    }
    assert!(!dir.path().join("origin").exists());
}

#[tokio::test]
async fn test_archive_uses_category_and_url_derived_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/ch1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ch1</html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let request =
        FetchRequest::new(format!("{}/book/ch1", server.uri())).with_category("mybook");
    let outcome = fetcher(&dir, 2).fetch(&request).await;

    match outcome {
        FetchOutcome::Success { archive_path, .. } => {
            let path = archive_path.unwrap();
            assert!(path.starts_with(dir.path().join("origin").join("mybook")));
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.ends_with(".html"));
            assert!(name.contains("book_ch1"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}
