//! Tunematch Core Library
//!
//! Reconciliation and resilient-acquisition core for a music catalog sync
//! tool. Catalog data (artists, albums, tracks) is ingested from several
//! independent, rate-limited, sometimes hostile remote catalogs; this crate
//! decides whether a candidate record from one source represents the same
//! track as a target record, and provides the network-resilience plumbing
//! the per-provider API clients depend on to obtain candidates reliably.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`text`] - display-text normalization for comparison and storage
//! - [`matching`] - candidate scoring, filtering, and ranking against a
//!   target track
//! - [`proxy`] - egress proxy pool with validation and rotation policies
//! - [`request`] - retry/backoff wrapper with failure classification
//!
//! Provider-specific HTTP clients, persistence, tag IO, and scheduling are
//! external collaborators: they construct [`matching::MatchTarget`]s and
//! [`matching::TrackComparable`] adapters, and route their calls through
//! [`request::ResilientExecutor`] backed by a shared [`proxy::ProxyPool`].

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod matching;
pub mod proxy;
pub mod request;
pub mod text;

// Re-export commonly used types
pub use matching::{
    MatchTarget, MatchTargetBuilder, MatchTargetError, ScoreBreakdown, ScoredMatch,
    TrackComparable, score_candidates,
};
pub use proxy::{ProxyEntry, ProxyError, ProxyPool, ProxySource, RotationPolicy};
pub use request::{
    ClassifyFailure, DEFAULT_MAX_ATTEMPTS, ExecuteError, FailureKind, ResilientExecutor,
    RetryPolicy,
};
pub use text::normalize;
