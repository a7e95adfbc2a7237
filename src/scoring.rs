//! Scoring functions for cross-catalog song matching.
//!
//! One scorer serves both conversion directions. It compares a *free-text*
//! side (a single name field that embeds title and artist, used as a token
//! bag) against a *structured* side (separately known title and artist
//! tokens). `orient` decides which record plays which role.

use rustc_hash::FxHashSet;

use crate::models::{CatalogLayout, MatchCandidate, SongRecord};

// ============================================================================
// Weights and Thresholds
// ============================================================================

/// Full coverage of the structured title tokens.
pub const NAME_WEIGHT: f64 = 60.0;

/// Full coverage of the structured artist tokens.
pub const ARTIST_WEIGHT: f64 = 40.0;

/// Structured title appears verbatim inside the free-text name.
pub const SUBSTRING_BOOST: f64 = 20.0;

/// Upper bound of `score`.
pub const MAX_SCORE: f64 = NAME_WEIGHT + ARTIST_WEIGHT + SUBSTRING_BOOST;

/// Minimum top score to accept a match
pub const ACCEPT_THRESHOLD: f64 = 40.0;

// ============================================================================
// Token Overlap
// ============================================================================

/// Number of `needles` tokens present in `haystack`.
pub fn overlap(needles: &FxHashSet<String>, haystack: &FxHashSet<String>) -> usize {
    needles.iter().filter(|t| haystack.contains(*t)).count()
}

/// Weighted share of `needles` covered by `haystack`. Empty needles score 0.
fn coverage_term(weight: f64, needles: &FxHashSet<String>, haystack: &FxHashSet<String>) -> f64 {
    if needles.is_empty() {
        return 0.0;
    }
    weight * overlap(needles, haystack) as f64 / needles.len() as f64
}

// ============================================================================
// Scoring
// ============================================================================

/// Score from raw normalized fields. Result is in `[0, MAX_SCORE]`.
///
/// - title coverage: `60 * |title ∩ free| / |title|`
/// - artist coverage: `40 * |artist ∩ free| / |artist|`
/// - `+20` when the structured title is a substring of the free-text name
pub fn score_fields(
    free_tokens: &FxHashSet<String>,
    free_norm: &str,
    title_tokens: &FxHashSet<String>,
    artist_tokens: &FxHashSet<String>,
    title_norm: &str,
) -> f64 {
    let mut score = coverage_term(NAME_WEIGHT, title_tokens, free_tokens);
    score += coverage_term(ARTIST_WEIGHT, artist_tokens, free_tokens);

    if !title_norm.is_empty() && free_norm.contains(title_norm) {
        score += SUBSTRING_BOOST;
    }

    score
}

/// Score a free-text record against a structured record.
pub fn score(free: &SongRecord, structured: &SongRecord) -> f64 {
    score_fields(
        &free.name_tokens,
        &free.name_norm,
        &structured.name_tokens,
        &structured.artist_tokens,
        &structured.name_norm,
    )
}

/// Assign the free-text and structured roles for one query/candidate pair.
///
/// The candidate is the structured side unless the query comes from a
/// structured catalog and the candidate from a free-text one, in which case
/// the roles swap. Returns `(free, structured)`.
pub fn orient<'a>(
    query: &'a SongRecord,
    query_layout: CatalogLayout,
    candidate: &'a SongRecord,
    candidate_layout: CatalogLayout,
) -> (&'a SongRecord, &'a SongRecord) {
    match (query_layout, candidate_layout) {
        (CatalogLayout::Structured, CatalogLayout::FreeText) => (candidate, query),
        _ => (query, candidate),
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Score `query` against every candidate and return those scoring above
/// zero, best first. Equal scores go to the lower candidate ID.
pub fn rank_candidates<'a>(
    query: &SongRecord,
    query_layout: CatalogLayout,
    candidates: &'a [SongRecord],
    candidate_layout: CatalogLayout,
) -> Vec<MatchCandidate<'a>> {
    let mut ranked: Vec<MatchCandidate<'a>> = candidates
        .iter()
        .filter_map(|song| {
            let (free, structured) = orient(query, query_layout, song, candidate_layout);
            let score = score(free, structured);
            // Zero can never clear the threshold, so it never enters the ranking.
            (score > 0.0).then_some(MatchCandidate { score, song })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.song.id.cmp(&b.song.id))
    });
    ranked
}

/// Whether a top score is good enough to accept.
pub fn is_accepted(score: f64) -> bool {
    score >= ACCEPT_THRESHOLD
}
