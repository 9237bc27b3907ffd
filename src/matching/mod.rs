//! Candidate track matching against a target record.
//!
//! This module decides whether a candidate record fetched from one catalog
//! represents the same track as a target record (a locally scanned file, or
//! a record from another catalog), despite inconsistent spelling,
//! punctuation, casing, and missing fields.
//!
//! The pieces:
//! - [`TrackComparable`] - uniform read-only view over heterogeneous
//!   provider track shapes; provider adapters implement it by projection.
//! - [`MatchTarget`] - the record being identified, with a stable identity
//!   key; all fields are mandatory at construction.
//! - [`score_candidates`] - ranks and filters candidates against a target
//!   using fuzzy and exact signals.
//!
//! Scoring is pure and reentrant; no shared state, no synchronization.

pub mod comparable;
pub mod error;
pub mod scorer;
pub mod target;

pub use comparable::TrackComparable;
pub use error::MatchTargetError;
pub use scorer::{ScoreBreakdown, ScoredMatch, score_candidates};
pub use target::{MatchTarget, MatchTargetBuilder};
