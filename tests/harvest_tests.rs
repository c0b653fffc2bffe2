//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the source endpoints and
//! exercise the full fetch, extract, dedup and checkpoint cycle
//! end-to-end.

use mtharvest::config::{CheckpointConfig, Config, FetchConfig, HarvesterConfig};
use mtharvest::extract::ExtractionEngine;
use mtharvest::harvester::{build_http_client, fetch_source, Coordinator, FetchOutcome, HarvestContext};
use mtharvest::output::{load_checkpoint, load_plain_list};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET_A: &str = "dd00112233445566778899aabbccddeeff";
const SECRET_B: &str = "eeff00112233445566778899aabbccdd";

/// Creates a test configuration pointing at the given sources
fn create_test_config(dir: &TempDir, sources: Vec<String>) -> Config {
    Config {
        harvester: HarvesterConfig {
            concurrency_limit: 4,
            store_capacity: 1000,
            cycle_delay_secs: 1,
            candidate_budget: 5000,
        },
        fetch: create_fetch_config(),
        checkpoint: CheckpointConfig {
            json_path: dir.path().join("proxies.json").display().to_string(),
            list_path: dir.path().join("proxies.txt").display().to_string(),
            interval_secs: 1,
            stats_interval_secs: 60,
        },
        sources,
        user_agents: vec![],
        extra_patterns: vec![],
    }
}

fn create_fetch_config() -> FetchConfig {
    FetchConfig {
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        stall_timeout_secs: 5,
        max_redirects: 5,
        max_body_bytes: 1024 * 1024,
        max_retries: 0,
        retry_backoff_ms: 10,
    }
}

/// Runs a coordinator until shortly after the first cycle completes
async fn run_briefly(coordinator: &Coordinator, millis: u64) {
    let cancel = coordinator.cancel_flag();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        cancel.cancel();
    });
    coordinator.run().await.expect("Harvest failed");
}

#[tokio::test]
async fn test_full_harvest_pipeline() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // One source publishes labeled text, the other a tg:// link
    Mock::given(method("GET"))
        .and(path("/labeled"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "Fresh proxies!\nServer: 149.154.175.50 Port: 443 Secret: {}\n",
            SECRET_A
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/links"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "try this one: tg://proxy?server=proxy.example.org&port=8443&secret={}",
            SECRET_B
        )))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &dir,
        vec![
            format!("{}/labeled", base_url),
            format!("{}/links", base_url),
        ],
    );

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    run_briefly(&coordinator, 1200).await;

    let checkpoint = load_checkpoint(&dir.path().join("proxies.json")).unwrap();
    assert_eq!(checkpoint.version, "2.0");
    assert_eq!(checkpoint.total_proxies, 2);
    assert_eq!(checkpoint.proxies.len(), 2);

    let servers: Vec<&str> = checkpoint
        .proxies
        .iter()
        .map(|p| p.server.as_str())
        .collect();
    assert!(servers.contains(&"149.154.175.50"));
    assert!(servers.contains(&"proxy.example.org"));

    let ipv4 = checkpoint
        .proxies
        .iter()
        .find(|p| p.server == "149.154.175.50")
        .unwrap();
    assert_eq!(ipv4.port, "443");
    assert_eq!(ipv4.secret, SECRET_A);
    assert_eq!(ipv4.server_type, "IPv4");
    assert!(ipv4.source.ends_with("/labeled"));

    let domain = checkpoint
        .proxies
        .iter()
        .find(|p| p.server == "proxy.example.org")
        .unwrap();
    assert_eq!(domain.server_type, "Domain");

    // The plain list carries one connection URL per record
    let urls = load_plain_list(&dir.path().join("proxies.txt")).unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| u.starts_with("tg://proxy?server=")));
}

#[tokio::test]
async fn test_duplicate_across_sources_stored_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Both sources publish the same proxy in different syntaxes
    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "Server: 1.2.3.4 Port: 443 Secret: {}",
            SECRET_A
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "tg://proxy?server=1.2.3.4&port=443&secret={}",
            SECRET_A
        )))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &dir,
        vec![format!("{}/one", base_url), format!("{}/two", base_url)],
    );

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    run_briefly(&coordinator, 1200).await;

    let checkpoint = load_checkpoint(&dir.path().join("proxies.json")).unwrap();
    assert_eq!(checkpoint.total_proxies, 1);
    assert_eq!(checkpoint.proxies[0].server, "1.2.3.4");
}

#[tokio::test]
async fn test_failed_source_does_not_abort_others() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "host: 5.6.7.8 port: 2398 key: {}",
            SECRET_B
        )))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &dir,
        vec![
            format!("{}/broken", base_url),
            format!("{}/good", base_url),
        ],
    );

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    run_briefly(&coordinator, 1200).await;

    let checkpoint = load_checkpoint(&dir.path().join("proxies.json")).unwrap();
    assert_eq!(checkpoint.total_proxies, 1);
    assert_eq!(checkpoint.proxies[0].server, "5.6.7.8");
    assert_eq!(checkpoint.proxies[0].port, "2398");
}

#[tokio::test]
async fn test_non_200_status_is_counted_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetch_config = create_fetch_config();
    let client = build_http_client(&fetch_config).unwrap();
    let engine = ExtractionEngine::new(&[], 5000).unwrap();
    let ctx = Arc::new(HarvestContext::new(100));

    let outcome = fetch_source(
        &client,
        &fetch_config,
        &engine,
        &ctx,
        &[],
        &format!("{}/missing", mock_server.uri()),
    )
    .await;

    match outcome {
        FetchOutcome::HttpStatus(404) => {}
        other => panic!("Expected HttpStatus(404), got {:?}", other),
    }
    let snapshot = ctx.stats.snapshot();
    assert_eq!(snapshot.network_errors, 1);
    assert_eq!(snapshot.sources_fetched, 0);
}

#[tokio::test]
async fn test_body_truncated_at_cap() {
    let mock_server = MockServer::start().await;

    // Record sits inside the cap; the trailing filler does not
    let mut body = format!("Server: 9.9.9.9 Port: 443 Secret: {}\n", SECRET_A);
    body.push_str(&"x".repeat(8192));

    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let mut fetch_config = create_fetch_config();
    fetch_config.max_body_bytes = 2048;
    let client = build_http_client(&fetch_config).unwrap();
    let engine = ExtractionEngine::new(&[], 5000).unwrap();
    let ctx = Arc::new(HarvestContext::new(100));

    let outcome = fetch_source(
        &client,
        &fetch_config,
        &engine,
        &ctx,
        &[],
        &format!("{}/huge", mock_server.uri()),
    )
    .await;

    match outcome {
        FetchOutcome::Success { bytes, new_records } => {
            assert_eq!(bytes, 2048);
            assert_eq!(new_records, 1);
        }
        other => panic!("Expected Success, got {:?}", other),
    }
    assert_eq!(ctx.stats.snapshot().bytes_transferred, 2048);
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let mock_server = MockServer::start().await;

    // With a single-entry pool every request must carry that identity
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(header("user-agent", "mtharvest-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetch_config = create_fetch_config();
    let client = build_http_client(&fetch_config).unwrap();
    let engine = ExtractionEngine::new(&[], 5000).unwrap();
    let ctx = Arc::new(HarvestContext::new(100));

    let outcome = fetch_source(
        &client,
        &fetch_config,
        &engine,
        &ctx,
        &["mtharvest-test/1.0".to_string()],
        &format!("{}/list", mock_server.uri()),
    )
    .await;

    match outcome {
        FetchOutcome::Success { new_records: 0, .. } => {}
        other => panic!("Expected empty Success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_failure_retried_with_backoff() {
    // Port 9 (discard) refuses connections, so every attempt is a
    // transport failure. Two retries at 200ms linear backoff mean the
    // call cannot return before 200 + 400 ms of waiting.
    let mut fetch_config = create_fetch_config();
    fetch_config.max_retries = 2;
    fetch_config.retry_backoff_ms = 200;
    let client = build_http_client(&fetch_config).unwrap();
    let engine = ExtractionEngine::new(&[], 5000).unwrap();
    let ctx = Arc::new(HarvestContext::new(100));

    let start = std::time::Instant::now();
    let outcome = fetch_source(
        &client,
        &fetch_config,
        &engine,
        &ctx,
        &[],
        "http://127.0.0.1:9/unreachable",
    )
    .await;

    match outcome {
        FetchOutcome::Transport(_) => {}
        other => panic!("Expected Transport, got {:?}", other),
    }
    assert!(
        start.elapsed() >= Duration::from_millis(600),
        "retries returned after only {:?}",
        start.elapsed()
    );

    // The whole retried attempt counts as one failure, not three
    let snapshot = ctx.stats.snapshot();
    assert_eq!(snapshot.network_errors, 1);
    assert_eq!(snapshot.sources_fetched, 0);
}

#[tokio::test]
async fn test_transport_failure_without_retries_fails_fast() {
    let fetch_config = create_fetch_config();
    let client = build_http_client(&fetch_config).unwrap();
    let engine = ExtractionEngine::new(&[], 5000).unwrap();
    let ctx = Arc::new(HarvestContext::new(100));

    let start = std::time::Instant::now();
    let outcome = fetch_source(
        &client,
        &fetch_config,
        &engine,
        &ctx,
        &[],
        "http://127.0.0.1:9/unreachable",
    )
    .await;

    match outcome {
        FetchOutcome::Transport(_) => {}
        other => panic!("Expected Transport, got {:?}", other),
    }
    // Only the pre-request jitter precedes the single attempt
    assert!(start.elapsed() < Duration::from_millis(600));
    assert_eq!(ctx.stats.snapshot().network_errors, 1);
}

#[tokio::test]
async fn test_cancellation_preserves_collected_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "Server: 7.7.7.7 Port: 443 Secret: {}",
            SECRET_A
        )))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{}/list", base_url)]);

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    run_briefly(&coordinator, 800).await;

    // The final checkpoint reflects everything collected before shutdown
    let checkpoint = load_checkpoint(&dir.path().join("proxies.json")).unwrap();
    assert_eq!(checkpoint.total_proxies, 1);

    let urls = load_plain_list(&dir.path().join("proxies.txt")).unwrap();
    assert_eq!(
        urls,
        vec![format!(
            "tg://proxy?server=7.7.7.7&port=443&secret={}",
            SECRET_A
        )]
    );
}
