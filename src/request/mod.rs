//! Resilient execution of outbound provider calls.
//!
//! Provider API clients wrap each outbound call in a [`ResilientExecutor`]:
//! failures are classified into [`FailureKind`]s, transient ones (including
//! provider rate limiting) are retried with exponential backoff, and a
//! retry hook lets the proxy pool advance to a different egress path
//! between attempts. Fatal failures and exhausted retries propagate to the
//! caller, which decides whether to skip, log, or abort its unit of work.

pub mod retry;

pub use retry::{
    ClassifyFailure, DEFAULT_MAX_ATTEMPTS, ExecuteError, FailureKind, ResilientExecutor,
    RetryPolicy,
};
