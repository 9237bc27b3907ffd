//! Retry with exponential backoff and failure classification.
//!
//! A failed call is classified into a [`FailureKind`]: transient failures
//! and rate-limit signals are retried up to the attempt budget; everything
//! else propagates immediately. Classification is data the caller's error
//! type provides via [`ClassifyFailure`] - the retry loop branches on the
//! returned kind, never on error downcasting.
//!
//! Exhausting the budget surfaces as [`ExecuteError::Exhausted`] carrying
//! the last failure; this layer never converts exhaustion into an empty
//! result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::proxy::ProxyPool;

/// Default total attempt budget (including the initial attempt).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Classification of a failed outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network-transport failure or timeout; expected to recover on retry.
    Transient,

    /// Provider rate limiting; retried like a transient failure, but
    /// additionally signals the proxy pool to rotate where the active
    /// policy supports it.
    RateLimited,

    /// Anything else; retrying would not help, propagate immediately.
    Fatal,
}

impl FailureKind {
    /// Whether this failure is worth another attempt.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }
}

/// Implemented by caller error types so the executor can branch on data.
///
/// Each provider client decides what its transient and rate-limit signals
/// look like (some providers surface throttling as a generic
/// invalid-operation response rather than a clean 429).
pub trait ClassifyFailure {
    /// Classifies this failure for retry purposes.
    fn classify(&self) -> FailureKind;
}

/// Failure surfaced by [`ResilientExecutor::execute`].
#[derive(Debug, Error)]
pub enum ExecuteError<E: std::error::Error> {
    /// The attempt budget ran out; carries the last underlying failure.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        /// How many attempts were made.
        attempts: u32,
        /// The failure of the final attempt.
        #[source]
        source: E,
    },

    /// A non-retryable failure, propagated unchanged from the first attempt
    /// that produced it.
    #[error(transparent)]
    Fatal(E),
}

/// Backoff schedule: up to `max_attempts` total attempts, sleeping `2^n`
/// seconds after failed attempt *n* (2s, 4s, 8s, 16s with the default
/// budget of 5). No jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom attempt budget (minimum 1).
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Total attempt budget, including the initial attempt.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to sleep after failed attempt `attempt` (1-indexed).
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt))
    }
}

/// Shared retry hook; fires once per retry with the failure kind that
/// triggered it.
type RetryHook = Arc<dyn Fn(FailureKind) + Send + Sync>;

/// Wraps a single outbound call with retry, backoff, and an optional
/// per-retry side effect.
///
/// The backoff sleep suspends only the calling task; dropping the enclosing
/// future between attempts cancels cleanly (nothing is swallowed inside the
/// sleep).
#[derive(Clone)]
pub struct ResilientExecutor {
    policy: RetryPolicy,
    on_retry: Option<RetryHook>,
}

impl std::fmt::Debug for ResilientExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientExecutor")
            .field("policy", &self.policy)
            .field("has_retry_hook", &self.on_retry.is_some())
            .finish()
    }
}

impl Default for ResilientExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl ResilientExecutor {
    /// Creates an executor with the given retry policy and no retry hook.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            on_retry: None,
        }
    }

    /// Installs a side-effecting hook fired once before every retry.
    #[must_use]
    pub fn with_retry_hook(mut self, hook: impl Fn(FailureKind) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Wires the retry hook to [`ProxyPool::rotate_for_failure`], so each
    /// retry may go out a different egress path when the pool's policy
    /// opts in.
    #[must_use]
    pub fn with_proxy_rotation(self, pool: Arc<ProxyPool>) -> Self {
        self.with_retry_hook(move |kind| pool.rotate_for_failure(kind))
    }

    /// The configured retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes `operation`, retrying transient and rate-limited failures
    /// with exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError::Fatal`] for a non-retryable failure (zero
    /// retries spent), or [`ExecuteError::Exhausted`] with the last failure
    /// once the attempt budget runs out.
    #[instrument(level = "debug", skip_all, fields(max_attempts = self.policy.max_attempts))]
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, ExecuteError<E>>
    where
        E: ClassifyFailure + std::error::Error,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "executing operation");

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation recovered after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let kind = error.classify();
            if !kind.is_retryable() {
                debug!(attempt, error = %error, "fatal failure, not retrying");
                return Err(ExecuteError::Fatal(error));
            }

            if attempt >= self.policy.max_attempts {
                warn!(attempts = attempt, error = %error, "retry budget exhausted");
                return Err(ExecuteError::Exhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            if let Some(hook) = &self.on_retry {
                hook(kind);
            }

            let delay = self.policy.backoff_delay(attempt);
            warn!(
                attempt,
                next_attempt = attempt + 1,
                delay_secs = delay.as_secs(),
                ?kind,
                error = %error,
                "retrying after transient failure"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
