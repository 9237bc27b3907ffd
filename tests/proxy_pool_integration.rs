//! Integration tests for proxy pool validation against a mock probe target.
//!
//! The mock server plays the role of an HTTP proxy: with a plain-http probe
//! URL, reqwest sends the probe request straight to the proxy address, so a
//! wiremock server standing in for the proxy sees the request and can
//! answer it like a working (or broken) egress proxy would.

use tempfile::TempDir;
use tunematch_core::{ProxyError, ProxyPool, ProxySource, RotationPolicy};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Probe target; never resolved directly - the request goes to the proxy.
const PROBE_URL: &str = "http://probe.invalid/";

/// A proxy address nothing listens on; probes fail with connection refused.
const DEAD_PROXY: &str = "http://127.0.0.1:9";

/// Starts a mock "proxy" that answers every probe like a working egress.
async fn working_proxy() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(600)))
        .mount(&server)
        .await;
    server
}

/// Starts a mock "proxy" that returns 200 but with a body below the floor
/// (the signature of an interception page from a broken proxy).
async fn thin_body_proxy() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("tiny"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_unconfigured_pool_hands_out_no_proxy_and_never_errors() {
    let pool = ProxyPool::new(ProxySource::none(), RotationPolicy::RoundRobin);

    for _ in 0..5 {
        let handed = pool.next_proxy().await.expect("no-op pool must not error");
        assert!(handed.is_none());
    }
}

#[tokio::test]
async fn test_working_adhoc_proxy_survives_validation() {
    let proxy = working_proxy().await;

    let pool = ProxyPool::new(
        ProxySource::from_adhoc(proxy.uri()),
        RotationPolicy::StickyTillError,
    )
    .with_probe_url(PROBE_URL);

    let entry = pool
        .next_proxy()
        .await
        .expect("validation should succeed")
        .expect("a working proxy should be handed out");
    assert_eq!(entry.uri(), proxy.uri());
    assert_eq!(entry.request_count(), 1);
}

#[tokio::test]
async fn test_all_proxies_failing_validation_is_fatal() {
    let pool = ProxyPool::new(
        ProxySource::from_adhoc(DEAD_PROXY),
        RotationPolicy::Random,
    )
    .with_probe_url(PROBE_URL);

    let result = pool.next_proxy().await;
    match result {
        Err(ProxyError::NoWorkingProxies { configured }) => assert_eq!(configured, 1),
        other => panic!("expected NoWorkingProxies, got {other:?}"),
    }
}

#[tokio::test]
async fn test_thin_probe_body_fails_validation() {
    let proxy = thin_body_proxy().await;

    let pool = ProxyPool::new(
        ProxySource::from_adhoc(proxy.uri()),
        RotationPolicy::Random,
    )
    .with_probe_url(PROBE_URL);

    assert!(matches!(
        pool.next_proxy().await,
        Err(ProxyError::NoWorkingProxies { configured: 1 })
    ));
}

#[tokio::test]
async fn test_mixed_list_keeps_only_working_proxies() {
    let proxy = working_proxy().await;

    let temp_dir = TempDir::new().expect("temp dir");
    let list_path = temp_dir.path().join("proxies.txt");
    let contents = format!(
        "# egress pool\n\
         {DEAD_PROXY}\n\
         \n\
         {}\n\
         not a proxy line\n",
        proxy.uri()
    );
    std::fs::write(&list_path, contents).expect("write proxy list");

    let pool = ProxyPool::new(
        ProxySource::from_list_file(&list_path),
        RotationPolicy::RoundRobin,
    )
    .with_probe_url(PROBE_URL);

    // Only the working proxy survives; RoundRobin over a single entry keeps
    // returning it.
    for _ in 0..3 {
        let entry = pool
            .next_proxy()
            .await
            .expect("one working proxy validates")
            .expect("pool is configured");
        assert_eq!(entry.uri(), proxy.uri());
    }
}

#[tokio::test]
async fn test_list_of_dead_and_malformed_entries_is_fatal() {
    let temp_dir = TempDir::new().expect("temp dir");
    let list_path = temp_dir.path().join("proxies.txt");
    std::fs::write(&list_path, format!("{DEAD_PROXY}\ngarbage line\n")).expect("write proxy list");

    let pool = ProxyPool::new(
        ProxySource::from_list_file(&list_path),
        RotationPolicy::Random,
    )
    .with_probe_url(PROBE_URL);

    // Both lines count as configured: one failed the probe, one never
    // parsed. Neither works, so initialization is fatal.
    match pool.next_proxy().await {
        Err(ProxyError::NoWorkingProxies { configured }) => assert_eq!(configured, 2),
        other => panic!("expected NoWorkingProxies, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_proxy_list_file_is_io_error() {
    let pool = ProxyPool::new(
        ProxySource::from_list_file("/nonexistent/proxies.txt"),
        RotationPolicy::Random,
    )
    .with_probe_url(PROBE_URL);

    assert!(matches!(pool.next_proxy().await, Err(ProxyError::Io { .. })));
}

#[tokio::test]
async fn test_round_robin_cycles_over_two_working_proxies() {
    let first = working_proxy().await;
    let second = working_proxy().await;

    let temp_dir = TempDir::new().expect("temp dir");
    let list_path = temp_dir.path().join("proxies.txt");
    std::fs::write(&list_path, format!("{}\n{}\n", first.uri(), second.uri()))
        .expect("write proxy list");

    let pool = ProxyPool::new(
        ProxySource::from_list_file(&list_path),
        RotationPolicy::RoundRobin,
    )
    .with_probe_url(PROBE_URL);

    let mut seen = Vec::new();
    for _ in 0..4 {
        let entry = pool
            .next_proxy()
            .await
            .expect("both proxies validate")
            .expect("pool is configured");
        seen.push(entry.uri().to_string());
    }

    // Two proxies, four calls: each visited exactly twice, cyclically.
    assert_eq!(seen[0], seen[2]);
    assert_eq!(seen[1], seen[3]);
    assert_ne!(seen[0], seen[1]);
}
