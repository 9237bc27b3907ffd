//! Integration tests wiring the resilient executor to the proxy pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;
use tunematch_core::{
    ClassifyFailure, ExecuteError, FailureKind, ProxyPool, ProxySource, ResilientExecutor,
    RetryPolicy, RotationPolicy,
};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROBE_URL: &str = "http://probe.invalid/";

/// Provider-client-shaped error for end-to-end tests.
#[derive(Debug, Error)]
enum ProviderError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider throttled the request")]
    Throttled,
    #[error("unknown album id")]
    UnknownAlbum,
}

impl ClassifyFailure for ProviderError {
    fn classify(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transient,
            Self::Throttled => FailureKind::RateLimited,
            Self::UnknownAlbum => FailureKind::Fatal,
        }
    }
}

/// Starts a mock "proxy" that answers every probe like a working egress.
async fn working_proxy() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(600)))
        .mount(&server)
        .await;
    server
}

/// Builds a sticky pool over two working mock proxies, validated eagerly so
/// the tests below start from a known rotation position.
async fn sticky_pool(
    first: &MockServer,
    second: &MockServer,
    temp_dir: &tempfile::TempDir,
) -> Arc<ProxyPool> {
    let list_path = temp_dir.path().join("proxies.txt");
    std::fs::write(&list_path, format!("{}\n{}\n", first.uri(), second.uri()))
        .expect("write proxy list");

    let pool = Arc::new(
        ProxyPool::new(
            ProxySource::from_list_file(&list_path),
            RotationPolicy::StickyTillError,
        )
        .with_probe_url(PROBE_URL),
    );

    // First hand-out triggers validation.
    pool.next_proxy()
        .await
        .expect("both proxies validate")
        .expect("pool is configured");

    pool
}

#[tokio::test]
async fn test_retry_rotates_sticky_pool_to_new_egress() {
    let first = working_proxy().await;
    let second = working_proxy().await;
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let pool = sticky_pool(&first, &second, &temp_dir).await;

    let before = pool
        .next_proxy()
        .await
        .expect("pool validated")
        .expect("pool is configured")
        .uri()
        .to_string();

    let executor =
        ResilientExecutor::new(RetryPolicy::with_max_attempts(2)).with_proxy_rotation(Arc::clone(&pool));

    let calls = AtomicU32::new(0);
    let result: Result<&str, ExecuteError<ProviderError>> = executor
        .execute(|| {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if call == 1 {
                    Err(ProviderError::Transport("connection reset".to_string()))
                } else {
                    Ok("candidates")
                }
            }
        })
        .await;

    assert_eq!(result.expect("second attempt succeeds"), "candidates");

    let after = pool
        .next_proxy()
        .await
        .expect("pool validated")
        .expect("pool is configured")
        .uri()
        .to_string();
    assert_ne!(after, before, "retry hook should have advanced the sticky pool");
}

#[tokio::test]
async fn test_fatal_provider_error_leaves_pool_untouched() {
    let first = working_proxy().await;
    let second = working_proxy().await;
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let pool = sticky_pool(&first, &second, &temp_dir).await;

    let before = pool
        .next_proxy()
        .await
        .expect("pool validated")
        .expect("pool is configured")
        .uri()
        .to_string();

    let executor = ResilientExecutor::default().with_proxy_rotation(Arc::clone(&pool));

    let calls = AtomicU32::new(0);
    let result: Result<(), ExecuteError<ProviderError>> = executor
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::UnknownAlbum) }
        })
        .await;

    assert!(matches!(result, Err(ExecuteError::Fatal(ProviderError::UnknownAlbum))));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "fatal means zero retries");

    let after = pool
        .next_proxy()
        .await
        .expect("pool validated")
        .expect("pool is configured")
        .uri()
        .to_string();
    assert_eq!(after, before, "no rotation on a fatal failure");
}

#[tokio::test]
async fn test_exhaustion_surfaces_last_provider_error() {
    let executor = ResilientExecutor::new(RetryPolicy::with_max_attempts(2));

    let result: Result<(), ExecuteError<ProviderError>> = executor
        .execute(|| async { Err(ProviderError::Throttled) })
        .await;

    match result {
        Err(ExecuteError::Exhausted { attempts, source }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(source, ProviderError::Throttled));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_operation_fetches_through_pool_proxy() {
    let proxy = working_proxy().await;
    let pool = Arc::new(
        ProxyPool::new(
            ProxySource::from_adhoc(proxy.uri()),
            RotationPolicy::StickyTillError,
        )
        .with_probe_url(PROBE_URL),
    );

    let executor = ResilientExecutor::default().with_proxy_rotation(Arc::clone(&pool));
    let operation_pool = Arc::clone(&pool);

    // The shape provider clients use: obtain egress from the pool, route
    // the call through it, map transport problems to a transient error.
    let result: Result<u16, ExecuteError<ProviderError>> = executor
        .execute(move || {
            let pool = Arc::clone(&operation_pool);
            async move {
                let entry = pool
                    .next_proxy()
                    .await
                    .map_err(|error| ProviderError::Transport(error.to_string()))?
                    .ok_or_else(|| ProviderError::Transport("pool is empty".to_string()))?;
                let proxy = entry
                    .reqwest_proxy()
                    .map_err(|error| ProviderError::Transport(error.to_string()))?;
                let client = reqwest::Client::builder()
                    .proxy(proxy)
                    .build()
                    .map_err(|error| ProviderError::Transport(error.to_string()))?;
                let response = client
                    .get(PROBE_URL)
                    .send()
                    .await
                    .map_err(|error| ProviderError::Transport(error.to_string()))?;
                Ok(response.status().as_u16())
            }
        })
        .await;

    assert_eq!(result.expect("call through proxy succeeds"), 200);
}
