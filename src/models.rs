//! Core data models for catalog conversion.
//!
//! This module contains the song record, catalog identity, and per-query
//! outcome types used throughout the conversion pipeline.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

use crate::normalize::{normalize_with, tokenize, TextOptions};

// ============================================================================
// Type Aliases
// ============================================================================

/// Song ID within one catalog's ID space.
pub type SongId = i64;

// ============================================================================
// Song Records
// ============================================================================

/// A song from either catalog with its normalized fields precomputed.
///
/// The normalized strings and token sets are pure functions of `raw_name`
/// and `raw_artist`; they are computed once in `new` and never mutated.
#[derive(Clone, Debug)]
pub struct SongRecord {
    pub id: SongId,
    pub raw_name: String,
    pub raw_artist: Option<String>,
    pub name_norm: String,
    pub artist_norm: String,
    pub name_tokens: FxHashSet<String>,
    pub artist_tokens: FxHashSet<String>,
}

impl SongRecord {
    pub fn new(id: SongId, raw_name: impl Into<String>, raw_artist: Option<String>) -> Self {
        Self::with_options(id, raw_name, raw_artist, TextOptions::default())
    }

    pub fn with_options(
        id: SongId,
        raw_name: impl Into<String>,
        raw_artist: Option<String>,
        opts: TextOptions,
    ) -> Self {
        let raw_name = raw_name.into();
        let name_norm = normalize_with(&raw_name, opts);
        let artist_norm = raw_artist
            .as_deref()
            .map(|a| normalize_with(a, opts))
            .unwrap_or_default();
        let name_tokens = tokenize(&name_norm);
        let artist_tokens = tokenize(&artist_norm);

        Self {
            id,
            raw_name,
            raw_artist,
            name_norm,
            artist_norm,
            name_tokens,
            artist_tokens,
        }
    }

    /// Display label used in reports: "name" or "name - artist".
    pub fn label(&self) -> String {
        match self.raw_artist.as_deref() {
            Some(artist) if !artist.is_empty() => format!("{} - {}", self.raw_name, artist),
            _ => self.raw_name.clone(),
        }
    }
}

// ============================================================================
// Catalog Identity
// ============================================================================

/// The two catalogs this tool converts between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CatalogKind {
    PypyDance,
    WannaDance,
}

impl CatalogKind {
    /// How song text is laid out in this catalog's records.
    pub fn layout(self) -> CatalogLayout {
        match self {
            CatalogKind::PypyDance => CatalogLayout::FreeText,
            CatalogKind::WannaDance => CatalogLayout::Structured,
        }
    }

    /// The catalog on the other side of a conversion.
    pub fn opposite(self) -> CatalogKind {
        match self {
            CatalogKind::PypyDance => CatalogKind::WannaDance,
            CatalogKind::WannaDance => CatalogKind::PypyDance,
        }
    }

    /// Local cache file name for the catalog JSON.
    pub fn cache_file_name(self) -> &'static str {
        match self {
            CatalogKind::PypyDance => "pypydance.json",
            CatalogKind::WannaDance => "wannadance.json",
        }
    }

    /// Default output file for ID lists converted INTO this catalog.
    pub fn default_output_name(self) -> &'static str {
        match self {
            CatalogKind::PypyDance => "converted_pypy_list.txt",
            CatalogKind::WannaDance => "converted_wd_list.txt",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            CatalogKind::PypyDance => "Pypy",
            CatalogKind::WannaDance => "WD",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::PypyDance => write!(f, "PypyDance"),
            CatalogKind::WannaDance => write!(f, "WannaDance"),
        }
    }
}

/// Free-text catalogs put title and artist together in one name field;
/// structured catalogs keep them separate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogLayout {
    FreeText,
    Structured,
}

// ============================================================================
// Requests
// ============================================================================

/// One entry of a conversion request, in the order the caller gave it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestedId {
    Valid(SongId),
    /// Token that is not a plain non-negative integer.
    Invalid(String),
}

impl fmt::Display for RequestedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedId::Valid(id) => write!(f, "{}", id),
            RequestedId::Invalid(token) => write!(f, "{}", token),
        }
    }
}

// ============================================================================
// Matching
// ============================================================================

/// A scored candidate for one query. Lives only as long as the ranking.
#[derive(Clone, Copy, Debug)]
pub struct MatchCandidate<'a> {
    pub score: f64,
    pub song: &'a SongRecord,
}

/// Terminal state of one requested ID. Exactly one is reached per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    InvalidId,
    Missing,
    Skipped,
    NoMatch,
    LowScore,
    Match,
}

impl MatchStatus {
    pub fn label(self) -> &'static str {
        match self {
            MatchStatus::InvalidId => "INVALID",
            MatchStatus::Missing => "MISSING",
            MatchStatus::Skipped => "SKIPPED",
            MatchStatus::NoMatch => "NO MATCH",
            MatchStatus::LowScore => "LOW SCORE",
            MatchStatus::Match => "MATCH",
        }
    }
}

/// Best candidate found for a query, detached from the catalog for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct BestCandidate {
    pub id: SongId,
    pub name: String,
    pub artist: Option<String>,
    pub score: f64,
}

impl BestCandidate {
    pub fn from_candidate(candidate: &MatchCandidate<'_>) -> Self {
        Self {
            id: candidate.song.id,
            name: candidate.song.raw_name.clone(),
            artist: candidate.song.raw_artist.clone(),
            score: candidate.score,
        }
    }
}

/// Per-ID status record for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct QueryOutcome {
    pub requested: String,
    pub status: MatchStatus,
    pub query_name: Option<String>,
    pub best: Option<BestCandidate>,
}

impl QueryOutcome {
    /// Target ID this outcome contributes to the result, if any.
    pub fn accepted_id(&self) -> Option<SongId> {
        match (self.status, &self.best) {
            (MatchStatus::Match, Some(best)) => Some(best.id),
            _ => None,
        }
    }
}

/// Result of converting one request: accepted target IDs in input order and
/// one outcome per requested entry.
#[derive(Clone, Debug, Default)]
pub struct Conversion {
    pub ids: Vec<SongId>,
    pub outcomes: Vec<QueryOutcome>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run conversion statistics.
#[derive(Default, Debug, Clone, Serialize)]
pub struct ConversionStats {
    pub requested: usize,
    pub matched: usize,
    pub low_score: usize,
    pub no_match: usize,
    pub skipped: usize,
    pub missing: usize,
    pub invalid: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl ConversionStats {
    pub fn from_outcomes(outcomes: &[QueryOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            stats.record(outcome.status);
        }
        stats
    }

    pub fn record(&mut self, status: MatchStatus) {
        self.requested += 1;
        match status {
            MatchStatus::Match => self.matched += 1,
            MatchStatus::LowScore => self.low_score += 1,
            MatchStatus::NoMatch => self.no_match += 1,
            MatchStatus::Skipped => self.skipped += 1,
            MatchStatus::Missing => self.missing += 1,
            MatchStatus::InvalidId => self.invalid += 1,
        }
    }

    /// Calculate match rate as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.requested == 0 {
            0.0
        } else {
            100.0 * self.matched as f64 / self.requested as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_record_derives_fields() {
        let song = SongRecord::new(100, "Despacito", Some("Luis Fonsi".to_string()));
        assert_eq!(song.name_norm, "despacito");
        assert_eq!(song.artist_norm, "luis fonsi");
        assert_eq!(song.name_tokens.len(), 1);
        assert!(song.artist_tokens.contains("fonsi"));
    }

    #[test]
    fn test_song_record_absent_artist_is_empty() {
        let song = SongRecord::new(1, "Despacito - Luis Fonsi", None);
        assert_eq!(song.artist_norm, "");
        assert!(song.artist_tokens.is_empty());
        assert_eq!(song.name_tokens.len(), 3);
    }

    #[test]
    fn test_song_record_is_deterministic() {
        let a = SongRecord::new(7, "Foo (Remix) [Live]", Some("Bar & Baz".to_string()));
        let b = SongRecord::new(7, "Foo (Remix) [Live]", Some("Bar & Baz".to_string()));
        assert_eq!(a.name_norm, b.name_norm);
        assert_eq!(a.artist_norm, b.artist_norm);
        assert_eq!(a.name_tokens, b.name_tokens);
        assert_eq!(a.artist_tokens, b.artist_tokens);
    }

    #[test]
    fn test_label() {
        let song = SongRecord::new(1, "Song", Some("Artist".to_string()));
        assert_eq!(song.label(), "Song - Artist");
        let song = SongRecord::new(2, "Song", Some(String::new()));
        assert_eq!(song.label(), "Song");
    }

    #[test]
    fn test_catalog_kind_layout() {
        assert_eq!(CatalogKind::PypyDance.layout(), CatalogLayout::FreeText);
        assert_eq!(CatalogKind::WannaDance.layout(), CatalogLayout::Structured);
        assert_eq!(CatalogKind::PypyDance.opposite(), CatalogKind::WannaDance);
    }

    #[test]
    fn test_stats_match_rate() {
        let mut stats = ConversionStats::default();
        assert_eq!(stats.match_rate(), 0.0);
        stats.record(MatchStatus::Match);
        stats.record(MatchStatus::Missing);
        stats.record(MatchStatus::LowScore);
        stats.record(MatchStatus::Match);
        assert_eq!(stats.requested, 4);
        assert_eq!(stats.matched, 2);
        assert_eq!(stats.match_rate(), 50.0);
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&MatchStatus::LowScore).unwrap();
        assert_eq!(json, "\"LOW_SCORE\"");
    }
}
