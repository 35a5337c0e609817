// End-to-end scans against mock servers

use delver_core::config::ScanConfig;
use delver_core::scan::{ScanOptions, execute_scan};
use delver_scanner::ScanError;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn write_wordlist(dir: &TempDir, words: &[&str]) -> std::path::PathBuf {
    let wordlist_path = dir.path().join("wordlist.txt");
    fs::write(&wordlist_path, words.join("\n")).unwrap();
    wordlist_path
}

fn fast_options() -> ScanOptions {
    ScanOptions {
        backoff_base: Duration::from_millis(5),
        ..ScanOptions::default()
    }
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_classification() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, "/a", 200).await;
    mount_status(&mock_server, "/b", 404).await;
    mount_status(&mock_server, "/c", 503).await;

    let temp_dir = TempDir::new().unwrap();
    let base = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let config = ScanConfig::new(base)
        .with_wordlist(write_wordlist(&temp_dir, &["a", "b", "c"]))
        .with_max_retries(1);

    let report = execute_scan(&config, fast_options()).await.unwrap();

    let a = format!("{}/a", mock_server.uri());
    let c = format!("{}/c", mock_server.uri());
    assert_eq!(report.total_requests, 3);
    assert_eq!(report.failed_requests, 0);
    assert_eq!(report.retries, 0);
    assert_eq!(report.discovered_endpoints, vec![a]);
    assert_eq!(report.unusual_endpoints, vec![(c, 503)]);
    assert_eq!(report.status_code_counts.get(&200), Some(&1));
    assert_eq!(report.status_code_counts.get(&404), Some(&1));
    assert_eq!(report.status_code_counts.get(&503), Some(&1));
    assert!(!report.interrupted);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_total_requests_matches_candidate_count() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, "/admin", 200).await;

    let words: Vec<String> = (0..40).map(|i| format!("path{}", i)).collect();
    let mut refs: Vec<&str> = words.iter().map(String::as_str).collect();
    refs.push("admin");
    refs.push("admin");

    let temp_dir = TempDir::new().unwrap();
    let base = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let config = ScanConfig::new(base)
        .with_wordlist(write_wordlist(&temp_dir, &refs))
        .with_concurrency(8);

    let report = execute_scan(&config, fast_options()).await.unwrap();

    // Unmatched wiremock routes answer 404
    assert_eq!(report.total_requests, 42);
    assert_eq!(report.status_code_counts.get(&404), Some(&40));
    assert_eq!(report.discovered_endpoints.len(), 2);
    assert!(report.unusual_endpoints.is_empty());
}

#[tokio::test]
async fn test_unreachable_target_counts_failures_and_retries() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let temp_dir = TempDir::new().unwrap();
    let base = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
    let config = ScanConfig::new(base)
        .with_wordlist(write_wordlist(&temp_dir, &["one", "two"]))
        .with_max_retries(3);

    let report = execute_scan(&config, fast_options()).await.unwrap();

    assert_eq!(report.total_requests, 2);
    assert_eq!(report.failed_requests, 2);
    assert_eq!(report.retries, 4);
    assert!(report.status_code_counts.is_empty());
    assert!(report.discovered_endpoints.is_empty());
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_rate_limit_spaces_requests() {
    let mock_server = MockServer::start().await;
    let words: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();

    let temp_dir = TempDir::new().unwrap();
    let base = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let config = ScanConfig::new(base)
        .with_wordlist(write_wordlist(&temp_dir, &refs))
        .with_rate_limit(5.0)
        .with_concurrency(10);

    let start = Instant::now();
    let report = execute_scan(&config, fast_options()).await.unwrap();

    assert_eq!(report.total_requests, 20);
    assert!(
        start.elapsed() >= Duration::from_millis(3800),
        "20 requests at 5/s finished in {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_missing_wordlist_is_fatal() {
    let config = ScanConfig::new(Url::parse("http://127.0.0.1:9/").unwrap())
        .with_wordlist(Path::new("/nonexistent/wordlist.txt").to_path_buf());

    let result = execute_scan(&config, fast_options()).await;
    assert!(matches!(result, Err(ScanError::SourceUnavailable(_))));
}

#[tokio::test]
async fn test_invalid_configuration_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config = ScanConfig::new(Url::parse("http://127.0.0.1:9/").unwrap())
        .with_wordlist(write_wordlist(&temp_dir, &["a"]))
        .with_header("Bad Name", "value");

    let result = execute_scan(&config, fast_options()).await;
    assert!(matches!(result, Err(ScanError::ConfigurationInvalid(_))));
}

#[tokio::test]
async fn test_empty_wordlist_produces_empty_report() {
    let temp_dir = TempDir::new().unwrap();
    let config = ScanConfig::new(Url::parse("http://127.0.0.1:9/").unwrap())
        .with_wordlist(write_wordlist(&temp_dir, &["", "   "]));

    let report = execute_scan(&config, fast_options()).await.unwrap();
    assert_eq!(report.total_requests, 0);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_cancelled_scan_returns_partial_report() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let words: Vec<String> = (0..10).map(|i| format!("slow{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let temp_dir = TempDir::new().unwrap();
    let base = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let config = ScanConfig::new(base)
        .with_wordlist(write_wordlist(&temp_dir, &refs))
        .with_timeout(Duration::from_secs(60))
        .with_concurrency(2);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let options = ScanOptions {
        cancel,
        ..fast_options()
    };
    let report = tokio::time::timeout(Duration::from_secs(10), execute_scan(&config, options))
        .await
        .expect("scan hung after cancellation")
        .unwrap();

    assert!(report.interrupted);
    assert!(report.total_requests < 10);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_interrupt_during_candidate_loading() {
    // No wordlist configured, so the remote default list would be fetched
    let config = ScanConfig::new(Url::parse("http://127.0.0.1:9/").unwrap());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let options = ScanOptions {
        cancel,
        ..fast_options()
    };
    let report = tokio::time::timeout(Duration::from_secs(2), execute_scan(&config, options))
        .await
        .expect("candidate loading ignored the interrupt")
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.total_requests, 0);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_verbose_scan_with_progress_bar() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, "/found", 200).await;
    mount_status(&mock_server, "/teapot", 418).await;

    let temp_dir = TempDir::new().unwrap();
    let base = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let config = ScanConfig::new(base)
        .with_wordlist(write_wordlist(&temp_dir, &["found", "teapot", "missing"]))
        .with_verbose(true);

    let options = ScanOptions {
        show_progress_bar: true,
        ..fast_options()
    };
    let report = execute_scan(&config, options).await.unwrap();

    assert_eq!(report.total_requests, 3);
    assert_eq!(report.discovered_endpoints.len(), 1);
    assert_eq!(
        report.unusual_endpoints,
        vec![(format!("{}/teapot", mock_server.uri()), 418)]
    );
}

#[tokio::test]
async fn test_tiny_rate_limit_is_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = ScanConfig::new(Url::parse("http://127.0.0.1:9/").unwrap())
        .with_wordlist(write_wordlist(&temp_dir, &["a"]))
        .with_rate_limit(1e-30);

    let result = execute_scan(&config, fast_options()).await;
    assert!(matches!(result, Err(ScanError::ConfigurationInvalid(_))));
}
