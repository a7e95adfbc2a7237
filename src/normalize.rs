//! Text normalization and tokenization shared by both catalogs.
//!
//! Every record is normalized once when its catalog is built, so the matcher
//! only ever compares precomputed strings and token sets.
//!
//! CRITICAL: the step order in `normalize_with` affects output. Both
//! conversion directions depend on it.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Bracketed annotation: "[Live]", "[MMD]". Non-greedy, stops at the first `]`.
pub static BRACKET_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());

/// Parenthesized annotation: "(Remix)", "(feat. Someone)". Non-greedy.
pub static PAREN_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").unwrap());

/// Anything that is not a Unicode word character or whitespace.
pub static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Runs of whitespace, collapsed to a single space.
pub static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ============================================================================
// OPTIONS
// ============================================================================

/// Knobs applied identically to every record of both catalogs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Fold accents and transliterate non-Latin scripts before stripping
    /// punctuation, so "Beyoncé" and "Beyonce" produce the same tokens.
    pub fold_ascii: bool,
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII: NFKD, drop combining marks, transliterate the rest.
/// e.g., "Beyoncé" → "Beyonce", "Кино" → "Kino"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped)
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a display string for matching.
///
/// Removes `[...]` spans, then `(...)` spans, replaces punctuation with
/// spaces, collapses whitespace, trims and lowercases. Empty input yields "".
pub fn normalize(s: &str) -> String {
    normalize_with(s, TextOptions::default())
}

/// `normalize` with explicit options. With `TextOptions::default()` this is
/// exactly `normalize`.
pub fn normalize_with(s: &str, opts: TextOptions) -> String {
    if s.is_empty() {
        return String::new();
    }

    let mut result = BRACKET_SPAN.replace_all(s, "").into_owned();
    result = PAREN_SPAN.replace_all(&result, "").into_owned();

    if opts.fold_ascii {
        result = fold_to_ascii(&result);
    }

    result = NON_WORD.replace_all(&result, " ").into_owned();
    result = WHITESPACE_RUN.replace_all(&result, " ").into_owned();

    result.trim().to_lowercase()
}

/// Split normalized text into its set of whitespace-delimited tokens.
pub fn tokenize(s: &str) -> FxHashSet<String> {
    s.split_whitespace().map(str::to_string).collect()
}
