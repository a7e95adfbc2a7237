//! Console report: one table row per requested ID plus a summary.

use crate::models::{CatalogKind, ConversionStats, MatchStatus, QueryOutcome};

/// Width of the query name column; longer names are cut.
pub const NAME_WIDTH: usize = 30;

pub fn header(source: CatalogKind, target: CatalogKind) -> String {
    format!(
        "{:<8} | {:<10} | {:<width$} | {}",
        format!("{} ID", source.short_name()),
        "Status",
        format!("{} Name", source.short_name()),
        format!("{} Match", target.short_name()),
        width = NAME_WIDTH
    )
}

pub fn separator() -> String {
    "-".repeat(100)
}

fn row(requested: &str, status: MatchStatus, name: &str, detail: &str) -> String {
    format!(
        "{:<8} | {:<10} | {:<width$.width$} | {}",
        requested,
        status.label(),
        name,
        detail,
        width = NAME_WIDTH
    )
}

/// Render one outcome. `source` names the cache file in MISSING rows.
pub fn format_outcome(outcome: &QueryOutcome, source: CatalogKind) -> String {
    let name = outcome.query_name.as_deref().unwrap_or("N/A");
    let best = outcome
        .best
        .as_ref()
        .map(|b| format!("[{}] {} (Score: {:.1})", b.id, b.name, b.score));

    match outcome.status {
        MatchStatus::InvalidId => row(&outcome.requested, outcome.status, "N/A", "Not a numeric ID"),
        MatchStatus::Missing => row(
            &outcome.requested,
            outcome.status,
            "N/A",
            &format!("ID not found in {}", source.cache_file_name()),
        ),
        MatchStatus::Skipped => row(&outcome.requested, outcome.status, "(Empty Name)", "Cannot match empty name"),
        MatchStatus::NoMatch => row(&outcome.requested, outcome.status, name, "No candidates found"),
        MatchStatus::LowScore => row(
            &outcome.requested,
            outcome.status,
            name,
            &format!("Best: {}", best.unwrap_or_default()),
        ),
        MatchStatus::Match => row(&outcome.requested, outcome.status, name, &best.unwrap_or_default()),
    }
}

/// One-line-per-status summary.
pub fn format_summary(stats: &ConversionStats) -> String {
    let mut lines = vec![format!(
        "Matched {}/{} ({:.1}%)",
        stats.matched,
        stats.requested,
        stats.match_rate()
    )];
    let buckets = [
        (MatchStatus::LowScore, stats.low_score),
        (MatchStatus::NoMatch, stats.no_match),
        (MatchStatus::Skipped, stats.skipped),
        (MatchStatus::Missing, stats.missing),
        (MatchStatus::InvalidId, stats.invalid),
    ];
    for (status, count) in buckets {
        if count > 0 {
            lines.push(format!("  {:<10} {}", status.label(), count));
        }
    }
    lines.join("\n")
}
