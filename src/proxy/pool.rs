//! Proxy pool loading, validation, and rotation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OnceCell, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::request::FailureKind;

use super::entry::ProxyEntry;
use super::error::ProxyError;

/// Default probe target for validation. Any stable page larger than the
/// body floor works; the override exists for tests and firewalled
/// deployments.
const DEFAULT_PROBE_URL: &str = "https://www.google.com/";

/// Per-probe timeout during validation.
const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum validation probes in flight at once.
const VALIDATION_CONCURRENCY: usize = 100;

/// A probe response body must exceed this many bytes to count as working;
/// interception pages and empty 200s from broken proxies fall below it.
const MIN_PROBE_BODY_BYTES: usize = 500;

/// How long the `RotateTime` policy stays on one proxy.
const ROTATE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Rule governing which proxy the pool hands out next, and when it
/// advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RotationPolicy {
    /// Uniform random pick, independent on every call.
    Random,
    /// Hand out the current entry, then always advance by one (wrapping).
    RoundRobin,
    /// Stay on the current entry; advance only when the caller reports a
    /// failure (typically wired to the retry hook).
    StickyTillError,
    /// Same selection as `StickyTillError`; the caller advances at artist
    /// boundaries instead of error boundaries.
    PerArtist,
    /// Stay on the current entry; advance lazily once five minutes have
    /// elapsed since the last advance.
    RotateTime,
}

impl RotationPolicy {
    /// Resolves a configured policy name, case-sensitively.
    ///
    /// Unrecognized names fall back to [`RotationPolicy::Random`] with a
    /// warning rather than failing startup.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Random" => Self::Random,
            "RoundRobin" => Self::RoundRobin,
            "StickyTillError" => Self::StickyTillError,
            "PerArtist" => Self::PerArtist,
            "RotateTime" => Self::RotateTime,
            other => {
                warn!(policy = other, "unrecognized rotation policy, using Random");
                Self::Random
            }
        }
    }
}

/// Where the pool's proxies come from: a newline-delimited list file, an
/// ad-hoc proxy string, both, or nothing (a no-op pool).
#[derive(Debug, Clone, Default)]
pub struct ProxySource {
    list_path: Option<PathBuf>,
    adhoc: Option<String>,
}

impl ProxySource {
    /// No proxies at all; the pool becomes a no-op.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Proxies from a file with one `scheme://[user:pass@]host:port` per
    /// line. Blank lines and `#` comments are skipped.
    #[must_use]
    pub fn from_list_file(path: impl Into<PathBuf>) -> Self {
        Self {
            list_path: Some(path.into()),
            adhoc: None,
        }
    }

    /// A single ad-hoc proxy string.
    #[must_use]
    pub fn from_adhoc(proxy: impl Into<String>) -> Self {
        Self {
            list_path: None,
            adhoc: Some(proxy.into()),
        }
    }

    /// Adds an ad-hoc proxy on top of the existing source.
    #[must_use]
    pub fn with_adhoc(mut self, proxy: impl Into<String>) -> Self {
        self.adhoc = Some(proxy.into());
        self
    }

    /// Whether any proxy source was declared.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.list_path.is_some() || self.adhoc.is_some()
    }
}

/// Rotation cursor. Invariant: `index` is reduced modulo the validated pool
/// size at every read, so it is always in range while the pool is
/// non-empty.
#[derive(Debug)]
struct RotationState {
    index: usize,
    rotated_at: Instant,
}

/// A tested set of egress proxies with a rotation policy.
///
/// The pool is constructed cheaply; candidates are loaded and validated on
/// the first [`next_proxy`](Self::next_proxy) call. Every candidate is
/// probed concurrently (bounded fan-out) against the probe URL; an entry is
/// working iff the probe returns HTTP 200 with a body over 500 bytes. A
/// configured source whose entries *all* fail validation is a fatal
/// configuration error - there is no silent fallback to direct egress.
///
/// The pool is `Send + Sync` and intended to be shared behind an `Arc`
/// across concurrently scoring/fetching tasks. Rotation state is
/// serialized under a lock; under concurrency the rotation order is
/// eventually, not strictly, fair.
#[derive(Debug)]
pub struct ProxyPool {
    source: ProxySource,
    policy: RotationPolicy,
    probe_url: String,
    validated: OnceCell<Vec<Arc<ProxyEntry>>>,
    rotation: Mutex<RotationState>,
}

impl ProxyPool {
    /// Creates a pool over the given source and rotation policy.
    #[must_use]
    pub fn new(source: ProxySource, policy: RotationPolicy) -> Self {
        Self {
            source,
            policy,
            probe_url: DEFAULT_PROBE_URL.to_string(),
            validated: OnceCell::new(),
            rotation: Mutex::new(RotationState {
                index: 0,
                rotated_at: Instant::now(),
            }),
        }
    }

    /// Creates a no-op pool: [`next_proxy`](Self::next_proxy) always
    /// returns `Ok(None)` and never errors.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(ProxySource::none(), RotationPolicy::Random)
    }

    /// Overrides the validation probe URL.
    #[must_use]
    pub fn with_probe_url(mut self, probe_url: impl Into<String>) -> Self {
        self.probe_url = probe_url.into();
        self
    }

    /// The configured rotation policy.
    #[must_use]
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Selects the proxy for the next outbound call, validating the pool on
    /// first use.
    ///
    /// Returns `Ok(None)` when no proxy source was configured. Each
    /// hand-out updates the entry's usage bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::NoWorkingProxies`] when a configured,
    /// non-empty source has zero entries surviving validation, and
    /// [`ProxyError::Io`] when the proxy list file cannot be read.
    #[instrument(level = "debug", skip(self))]
    pub async fn next_proxy(&self) -> Result<Option<Arc<ProxyEntry>>, ProxyError> {
        if !self.source.is_configured() {
            return Ok(None);
        }

        let validated = self
            .validated
            .get_or_try_init(|| self.load_and_validate())
            .await?;
        if validated.is_empty() {
            return Ok(None);
        }

        let index = self.select_index(validated.len());
        let entry = Arc::clone(&validated[index]);
        entry.mark_used();

        debug!(
            index,
            uri = entry.uri(),
            request_count = entry.request_count(),
            "handing out proxy"
        );

        Ok(Some(entry))
    }

    /// Force-advances the rotation cursor by one, wrapping modulo the pool
    /// size, and resets the rotation clock.
    ///
    /// No-op before validation has run or on an empty pool.
    pub fn advance(&self) {
        let Some(validated) = self.validated.get() else {
            return;
        };
        if validated.is_empty() {
            return;
        }

        let mut state = self.lock_rotation();
        state.index = (state.index + 1) % validated.len();
        state.rotated_at = Instant::now();
        debug!(index = state.index, "advanced proxy rotation");
    }

    /// Retry-hook entry point: advances the cursor when the active policy
    /// opts in for this failure kind.
    ///
    /// `StickyTillError` advances on any retried failure. `PerArtist` and
    /// `RotateTime` advance only on a rate-limit signal - their primary
    /// rotation trigger lives elsewhere. `Random` and `RoundRobin` ignore
    /// failures entirely since they rotate on every call anyway.
    pub fn rotate_for_failure(&self, kind: FailureKind) {
        let should_rotate = match self.policy {
            RotationPolicy::StickyTillError => true,
            RotationPolicy::PerArtist | RotationPolicy::RotateTime => {
                kind == FailureKind::RateLimited
            }
            RotationPolicy::Random | RotationPolicy::RoundRobin => false,
        };

        if should_rotate {
            debug!(?kind, policy = ?self.policy, "rotating proxy after failure");
            self.advance();
        }
    }

    /// Applies the rotation policy and returns the index to hand out.
    fn select_index(&self, pool_len: usize) -> usize {
        // Random reads no cursor state and must not contend on the
        // rotation lock.
        if self.policy == RotationPolicy::Random {
            return rand::thread_rng().gen_range(0..pool_len);
        }

        let mut state = self.lock_rotation();
        match self.policy {
            RotationPolicy::RoundRobin => {
                let current = state.index % pool_len;
                state.index = (current + 1) % pool_len;
                current
            }
            RotationPolicy::Random
            | RotationPolicy::StickyTillError
            | RotationPolicy::PerArtist => state.index % pool_len,
            RotationPolicy::RotateTime => {
                if state.rotated_at.elapsed() >= ROTATE_INTERVAL {
                    state.index = (state.index % pool_len + 1) % pool_len;
                    state.rotated_at = Instant::now();
                    debug!(index = state.index, "rotation interval elapsed");
                }
                state.index % pool_len
            }
        }
    }

    fn lock_rotation(&self) -> std::sync::MutexGuard<'_, RotationState> {
        self.rotation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads candidates from the source and probes them concurrently.
    async fn load_and_validate(&self) -> Result<Vec<Arc<ProxyEntry>>, ProxyError> {
        let (candidates, configured) = self.load_candidates().await?;
        if configured == 0 {
            return Ok(Vec::new());
        }

        info!(configured, probe_url = %self.probe_url, "validating proxy pool");

        let semaphore = Arc::new(Semaphore::new(VALIDATION_CONCURRENCY));
        let working = Arc::new(AsyncMutex::new(Vec::new()));
        let mut probes = JoinSet::new();

        for entry in candidates {
            let entry = Arc::new(entry);
            let semaphore = Arc::clone(&semaphore);
            let working = Arc::clone(&working);
            let probe_url = self.probe_url.clone();
            probes.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                if probe_entry(&entry, &probe_url).await {
                    working.lock().await.push(entry);
                } else {
                    debug!(uri = entry.uri(), "proxy failed validation probe");
                }
            });
        }

        while probes.join_next().await.is_some() {}

        let validated = working.lock().await.clone();
        if validated.is_empty() {
            return Err(ProxyError::no_working_proxies(configured));
        }

        info!(
            working = validated.len(),
            configured, "proxy pool validated"
        );
        Ok(validated)
    }

    /// Reads the proxy list file and ad-hoc string into candidate entries.
    ///
    /// Returns the candidates alongside the configured-entry count, which
    /// includes malformed (skipped) lines so that a source made entirely of
    /// unusable entries still fails validation loudly.
    async fn load_candidates(&self) -> Result<(Vec<ProxyEntry>, usize), ProxyError> {
        let mut candidates = Vec::new();
        let mut configured = 0usize;

        if let Some(path) = &self.source.list_path {
            let contents = tokio::fs::read_to_string(path)
                .await
                .map_err(|error| ProxyError::io(path, error))?;
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                configured += 1;
                match ProxyEntry::parse(line) {
                    Ok(entry) => candidates.push(entry),
                    Err(error) => warn!(%error, "skipping malformed proxy list line"),
                }
            }
        }

        if let Some(adhoc) = &self.source.adhoc {
            configured += 1;
            match ProxyEntry::parse(adhoc) {
                Ok(entry) => candidates.push(entry),
                Err(error) => warn!(%error, "skipping malformed ad-hoc proxy"),
            }
        }

        Ok((candidates, configured))
    }
}

/// Probes one candidate: HTTP 200 with a body over the floor means working.
async fn probe_entry(entry: &ProxyEntry, probe_url: &str) -> bool {
    let proxy = match entry.reqwest_proxy() {
        Ok(proxy) => proxy,
        Err(error) => {
            debug!(uri = entry.uri(), %error, "cannot build probe proxy");
            return false;
        }
    };

    let client = match reqwest::Client::builder()
        .proxy(proxy)
        .timeout(PROBE_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(error) => {
            debug!(uri = entry.uri(), %error, "cannot build probe client");
            return false;
        }
    };

    match client.get(probe_url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => {
            match response.bytes().await {
                Ok(body) => body.len() > MIN_PROBE_BODY_BYTES,
                Err(_) => false,
            }
        }
        _ => false,
    }
}
