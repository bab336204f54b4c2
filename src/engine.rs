//! One-call entry points over raw batches.
//!
//! Every call builds its own team registry and returns an owned report; no
//! state survives between calls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::bracket::{build, group, BracketTree};
use crate::calculate::summarize;
use crate::models::{
    Diagnosed, Diagnostic, EngineError, Match, MatchStatsSummary, RoundGroup, Team,
};
use crate::normalize::{normalize_records, parse_records, NormalizedBatch};
use crate::raw::{attach_results, RawMatchStats, RawResult};
use crate::schedule::{partition, Schedule};

/// Everything derived from one batch of raw matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketReport {
    pub teams: Vec<Team>,
    pub tree: BracketTree,
    pub rounds: Vec<RoundGroup>,
    /// Normalization diagnostics followed by structural ones
    pub diagnostics: Vec<Diagnostic>,
}

impl BracketReport {
    /// Whether the built tree passed its structural checks.
    pub fn is_valid(&self) -> bool {
        self.tree.valid
    }
}

/// Normalize a batch and build its bracket.
pub fn process_matches(records: &[Value]) -> BracketReport {
    process_matches_with_results(records, &[])
}

/// Like [`process_matches`], with a separate results listing merged into
/// matches that carry no result payload of their own.
pub fn process_matches_with_results(records: &[Value], results: &[RawResult]) -> BracketReport {
    let normalized = normalize(records, results);
    let mut diagnostics = normalized.diagnostics;

    let built = build(&normalized.data.matches);
    diagnostics.extend(built.diagnostics);
    let tree = built.data;
    let rounds = group(&tree);

    info!(
        "Processed {} records: {} matches, {} teams, {} rounds, {} diagnostics",
        records.len(),
        tree.len(),
        normalized.data.teams.len(),
        rounds.len(),
        diagnostics.len()
    );

    BracketReport {
        teams: normalized.data.teams,
        tree,
        rounds,
        diagnostics,
    }
}

/// Normalized matches only, without building a tree.
pub fn normalize_matches(records: &[Value], results: &[RawResult]) -> Diagnosed<Vec<Match>> {
    let normalized = normalize(records, results);
    Diagnosed::new(normalized.data.matches, normalized.diagnostics)
}

/// Normalize a batch and split it into live, upcoming and past matches.
pub fn process_schedule(records: &[Value], now: DateTime<Utc>) -> Diagnosed<Schedule> {
    let normalized = normalize(records, &[]);
    Diagnosed::new(
        partition(&normalized.data.matches, now),
        normalized.diagnostics,
    )
}

/// Summarize one raw statistics document.
///
/// A document that does not have the statistics shape yields an empty
/// summary and a single malformed-record diagnostic.
pub fn process_stats(document: &Value) -> Diagnosed<MatchStatsSummary> {
    match serde_json::from_value::<RawMatchStats>(document.clone()) {
        Ok(raw) => summarize(&raw),
        Err(e) => {
            warn!("Unreadable statistics document: {}", e);
            Diagnosed::new(
                MatchStatsSummary::default(),
                vec![EngineError::MalformedRecord {
                    index: 0,
                    reason: e.to_string(),
                }
                .into()],
            )
        }
    }
}

fn normalize(records: &[Value], results: &[RawResult]) -> Diagnosed<NormalizedBatch> {
    let parsed = parse_records(records);
    let mut diagnostics = parsed.diagnostics;

    let (indices, raws): (Vec<usize>, Vec<_>) = parsed.data.into_iter().unzip();
    let raws = if results.is_empty() {
        raws
    } else {
        attach_results(raws, results)
    };
    let records: Vec<_> = indices.into_iter().zip(raws).collect();

    let normalized = normalize_records(&records);
    diagnostics.extend(normalized.diagnostics);
    Diagnosed::new(normalized.data, diagnostics)
}
