//! Normalization of raw match batches.
//!
//! A batch is processed in three steps:
//! 1. parse every JSON value into a [`RawMatch`] and drop duplicate ids
//! 2. register every side with a fresh [`TeamRegistry`]
//! 3. normalize each record against the completed registry, so every match
//!    sees the last-seen spelling of each team name

mod matches;
mod registry;

pub use matches::*;
pub use registry::*;

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{Diagnosed, Diagnostic, EngineError, Match, MatchId, Team};
use crate::raw::RawMatch;

/// Normalized matches and the teams they reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedBatch {
    /// In input order, duplicates and malformed records removed
    pub matches: Vec<Match>,
    /// Real teams, ordered by id
    pub teams: Vec<Team>,
}

/// Parse JSON values into raw records; unparseable or id-less values are
/// reported as malformed, later duplicates of an id as `DuplicateId`.
pub fn parse_records(records: &[Value]) -> Diagnosed<Vec<(usize, RawMatch)>> {
    let mut parsed = Vec::with_capacity(records.len());
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, value) in records.iter().enumerate() {
        let raw: RawMatch = match serde_json::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping record #{}: {}", index, e);
                diagnostics.push(
                    EngineError::MalformedRecord {
                        index,
                        reason: e.to_string(),
                    }
                    .into(),
                );
                continue;
            }
        };

        let Some(key) = raw.key() else {
            warn!("Skipping record #{}: missing match id", index);
            diagnostics.push(
                EngineError::MalformedRecord {
                    index,
                    reason: "missing match id".to_string(),
                }
                .into(),
            );
            continue;
        };

        if !seen.insert(key.clone()) {
            warn!("Dropping duplicate match {} at record #{}", key, index);
            diagnostics.push(EngineError::DuplicateId(MatchId::from(key)).into());
            continue;
        }

        parsed.push((index, raw));
    }

    Diagnosed::new(parsed, diagnostics)
}

/// Normalize already-parsed records.
pub fn normalize_records(records: &[(usize, RawMatch)]) -> Diagnosed<NormalizedBatch> {
    let mut registry = TeamRegistry::new();
    for (_, raw) in records {
        register_sides(&mut registry, raw);
    }
    debug!("Registered {} teams", registry.len());

    let normalizer = MatchNormalizer::new(&registry);
    let mut matches = Vec::with_capacity(records.len());
    let mut diagnostics = Vec::new();

    for (index, raw) in records {
        match normalizer.normalize(*index, raw) {
            Ok(out) => {
                diagnostics.extend(out.diagnostics);
                matches.push(out.data);
            }
            Err(e) => {
                warn!("{}", e);
                diagnostics.push(e.into());
            }
        }
    }

    Diagnosed::new(
        NormalizedBatch {
            matches,
            teams: registry.teams(),
        },
        diagnostics,
    )
}

/// Parse and normalize a batch of raw JSON match values.
pub fn normalize_batch(records: &[Value]) -> Diagnosed<NormalizedBatch> {
    let parsed = parse_records(records);
    let normalized = normalize_records(&parsed.data);

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(normalized.diagnostics);
    Diagnosed::new(normalized.data, diagnostics)
}
