//! Conversion driver: one terminal status per requested ID.
//!
//! Queries are scored in parallel with rayon. Each query reads only the two
//! immutable catalogs, and the indexed collect keeps outcomes in input order.

use rayon::prelude::*;

use crate::catalog::Catalog;
use crate::models::{BestCandidate, Conversion, MatchStatus, QueryOutcome, RequestedId};
use crate::scoring::{is_accepted, rank_candidates};

/// Run one requested entry through the state machine:
/// invalid → missing → skipped → no match → low score / match.
pub fn resolve(request: &RequestedId, source: &Catalog, target: &Catalog) -> QueryOutcome {
    let requested = request.to_string();
    let id = match request {
        RequestedId::Valid(id) => *id,
        RequestedId::Invalid(_) => {
            return QueryOutcome {
                requested,
                status: MatchStatus::InvalidId,
                query_name: None,
                best: None,
            }
        }
    };

    let query = match source.get(id) {
        Some(song) => song,
        None => {
            return QueryOutcome {
                requested,
                status: MatchStatus::Missing,
                query_name: None,
                best: None,
            }
        }
    };
    let query_name = Some(query.raw_name.clone());

    // Only the name is used as query text, even when an artist is present.
    if query.name_norm.is_empty() {
        return QueryOutcome {
            requested,
            status: MatchStatus::Skipped,
            query_name,
            best: None,
        };
    }

    let ranked = rank_candidates(query, source.layout(), target.songs(), target.layout());
    let Some(top) = ranked.first() else {
        return QueryOutcome {
            requested,
            status: MatchStatus::NoMatch,
            query_name,
            best: None,
        };
    };

    let status = if is_accepted(top.score) {
        MatchStatus::Match
    } else {
        MatchStatus::LowScore
    };
    QueryOutcome {
        requested,
        status,
        query_name,
        best: Some(BestCandidate::from_candidate(top)),
    }
}

/// Convert a request from `source`'s ID space into `target`'s.
pub fn convert(request: &[RequestedId], source: &Catalog, target: &Catalog) -> Conversion {
    convert_with_progress(request, source, target, || {})
}

/// `convert`, calling `tick` once per finished query (from worker threads).
pub fn convert_with_progress<F>(request: &[RequestedId], source: &Catalog, target: &Catalog, tick: F) -> Conversion
where
    F: Fn() + Sync,
{
    let outcomes: Vec<QueryOutcome> = request
        .par_iter()
        .map(|r| {
            let outcome = resolve(r, source, target);
            tick();
            outcome
        })
        .collect();

    let ids = outcomes.iter().filter_map(QueryOutcome::accepted_id).collect();
    Conversion { ids, outcomes }
}
