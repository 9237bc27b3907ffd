//! Candidate scoring, filtering, and ranking against a match target.
//!
//! Per candidate, artist/album/title are compared with a fuzzy similarity
//! ratio (0-100, case-insensitive); ISRC/UPC/track number are exact; the
//! date rule treats a bare 4-character target year as a substring match.
//! Candidates below the caller's minimum match percentage on any of the
//! three fuzzy scores are dropped, as are candidates failing the
//! numeric-token guard (so "Volume 2" cannot fuzzy-match "Volume 3").
//!
//! Survivors are ranked by artist score, album score, title score
//! (descending), then duration offset (ascending). Finally, when at least
//! one survivor carries a strong corroborating signal (date, ISRC, or UPC),
//! survivors without any such signal are dropped.
//!
//! "No match" is a normal outcome: the result is simply empty.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use super::comparable::TrackComparable;
use super::target::MatchTarget;

/// Maximal runs of digits embedded in a field, e.g. `["2"]` for "Volume 2".
#[allow(clippy::expect_used)]
static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+").expect("numeric token regex is valid") // Static pattern, safe to panic
});

/// Per-pair scoring evidence, produced fresh for each (target, candidate)
/// pair and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    /// Identity key of the target the candidate was scored against.
    pub metadata_id: String,
    /// Fuzzy artist similarity, 0-100.
    pub artist_score: u8,
    /// Fuzzy album similarity, 0-100.
    pub album_score: u8,
    /// Fuzzy title similarity, 0-100.
    pub title_score: u8,
    /// Absolute difference between target and candidate durations, in whole
    /// seconds.
    pub duration_offset_secs: u64,
    /// Exact, case-sensitive ISRC equality. Two empty strings compare
    /// equal, so a target with an unknown ISRC matches every candidate
    /// whose ISRC is also unknown.
    pub isrc_matched: bool,
    /// Exact, case-sensitive UPC equality, with the same empty-vs-empty
    /// behavior as `isrc_matched`.
    pub upc_matched: bool,
    /// Date rule: bare 4-character target year contained in the candidate
    /// date, otherwise exact string equality.
    pub date_matched: bool,
    /// Exact track-number equality.
    pub track_number_matched: bool,
}

impl ScoreBreakdown {
    /// Whether any strong corroborating signal (date, ISRC, UPC) matched.
    ///
    /// Track number is deliberately not counted here - it collides too often
    /// across unrelated releases to corroborate anything on its own.
    ///
    /// Because empty fields compare equal, a target with no date and no
    /// codes grants this signal to every candidate that is also missing
    /// them. Callers with sparse metadata should treat the corroboration
    /// flags as meaningful only when the target field is populated.
    #[must_use]
    pub fn has_strong_signal(&self) -> bool {
        self.date_matched || self.isrc_matched || self.upc_matched
    }
}

/// One surviving candidate paired with its scoring evidence.
///
/// Borrows the candidate; created and discarded within a single scoring
/// call.
#[derive(Debug)]
pub struct ScoredMatch<'a, C: ?Sized> {
    candidate: &'a C,
    breakdown: ScoreBreakdown,
}

impl<'a, C: ?Sized> ScoredMatch<'a, C> {
    /// The candidate record this evidence belongs to.
    #[must_use]
    pub fn candidate(&self) -> &'a C {
        self.candidate
    }

    /// The scoring evidence.
    #[must_use]
    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    /// Consumes the match, keeping only the evidence.
    #[must_use]
    pub fn into_breakdown(self) -> ScoreBreakdown {
        self.breakdown
    }
}

/// Scores `candidates` against `target`, returning the ranked, filtered
/// survivors.
///
/// Every returned match satisfies
/// `artist_score/album_score/title_score >= min_match_percent` and the
/// numeric-token guard on all three text fields. The result order is a
/// total order independent of the input candidate order. An empty result
/// means "no match" and is not an error.
///
/// When any survivor carries a strong signal (date, ISRC, or UPC match),
/// survivors without one are dropped. Empty fields on both sides count as
/// matches here, so a target with unknown codes can corroborate code-less
/// candidates and evict survivors whose real codes merely differ; see
/// [`ScoreBreakdown::has_strong_signal`].
#[instrument(
    level = "debug",
    skip(target, candidates),
    fields(metadata_id = target.metadata_id())
)]
pub fn score_candidates<'a, C>(
    target: &MatchTarget,
    candidates: impl IntoIterator<Item = &'a C>,
    min_match_percent: u8,
) -> Vec<ScoredMatch<'a, C>>
where
    C: TrackComparable + ?Sized + 'a,
{
    let mut survivors: Vec<ScoredMatch<'a, C>> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let breakdown = score_pair(target, candidate);
            if passes_filters(target, candidate, &breakdown, min_match_percent) {
                Some(ScoredMatch {
                    candidate,
                    breakdown,
                })
            } else {
                None
            }
        })
        .collect();

    survivors.sort_by(compare_matches);

    // Strong corroborating signals, when present among the survivors, are
    // required of every survivor.
    if survivors
        .iter()
        .any(|scored| scored.breakdown.has_strong_signal())
    {
        survivors.retain(|scored| scored.breakdown.has_strong_signal());
    }

    debug!(
        metadata_id = target.metadata_id(),
        min_match_percent,
        survivors = survivors.len(),
        "scored candidates"
    );

    survivors
}

/// Computes the full scoring evidence for one (target, candidate) pair.
fn score_pair<C: TrackComparable + ?Sized>(target: &MatchTarget, candidate: &C) -> ScoreBreakdown {
    ScoreBreakdown {
        metadata_id: target.metadata_id().to_string(),
        artist_score: fuzzy_ratio(target.artist(), candidate.artist()),
        album_score: fuzzy_ratio(target.album(), candidate.album()),
        title_score: fuzzy_ratio(target.title(), candidate.title()),
        duration_offset_secs: target
            .duration()
            .as_secs()
            .abs_diff(candidate.duration().as_secs()),
        isrc_matched: target.isrc() == candidate.isrc(),
        upc_matched: target.upc() == candidate.upc(),
        date_matched: date_matches(target.date(), candidate.date()),
        track_number_matched: target.track_number() == candidate.track_number(),
    }
}

/// Threshold filter plus the numeric-token guard on all three text fields.
fn passes_filters<C: TrackComparable + ?Sized>(
    target: &MatchTarget,
    candidate: &C,
    breakdown: &ScoreBreakdown,
    min_match_percent: u8,
) -> bool {
    breakdown.artist_score >= min_match_percent
        && breakdown.album_score >= min_match_percent
        && breakdown.title_score >= min_match_percent
        && numeric_tokens_covered(target.artist(), candidate.artist())
        && numeric_tokens_covered(target.album(), candidate.album())
        && numeric_tokens_covered(target.title(), candidate.title())
}

/// Ranking comparator: artist, album, title descending, duration offset
/// ascending, then a stable lexicographic key over candidate fields so the
/// order never depends on input order.
fn compare_matches<C: TrackComparable + ?Sized>(
    left: &ScoredMatch<'_, C>,
    right: &ScoredMatch<'_, C>,
) -> Ordering {
    right
        .breakdown
        .artist_score
        .cmp(&left.breakdown.artist_score)
        .then_with(|| right.breakdown.album_score.cmp(&left.breakdown.album_score))
        .then_with(|| right.breakdown.title_score.cmp(&left.breakdown.title_score))
        .then_with(|| {
            left.breakdown
                .duration_offset_secs
                .cmp(&right.breakdown.duration_offset_secs)
        })
        .then_with(|| left.candidate.title().cmp(right.candidate.title()))
        .then_with(|| left.candidate.album().cmp(right.candidate.album()))
        .then_with(|| left.candidate.artist().cmp(right.candidate.artist()))
        .then_with(|| left.candidate.album_id().cmp(right.candidate.album_id()))
}

/// Fuzzy similarity ratio on lower-cased strings, scaled to 0-100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fuzzy_ratio(left: &str, right: &str) -> u8 {
    let similarity =
        strsim::normalized_levenshtein(&left.to_lowercase(), &right.to_lowercase());
    (similarity * 100.0).round() as u8
}

/// Date rule: a 4-character target date is a bare year and matches by
/// substring containment; anything else requires exact equality.
fn date_matches(target_date: &str, candidate_date: &str) -> bool {
    if target_date.chars().count() == 4 {
        candidate_date.contains(target_date)
    } else {
        target_date == candidate_date
    }
}

/// Whether every numeric token embedded in the target field also appears
/// among the candidate field's numeric tokens.
fn numeric_tokens_covered(target_field: &str, candidate_field: &str) -> bool {
    let candidate_tokens: Vec<&str> = NUMERIC_TOKEN
        .find_iter(candidate_field)
        .map(|found| found.as_str())
        .collect();

    NUMERIC_TOKEN
        .find_iter(target_field)
        .all(|token| candidate_tokens.contains(&token.as_str()))
}
