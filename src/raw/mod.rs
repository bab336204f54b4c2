//! Raw records as the tournament data source returns them.
//!
//! These types accept every shape seen across FACEIT championship payloads:
//! teams as an object or an array, ids as strings or integers, numbers as
//! numeric strings, and linkage either at the top level or under `bracket`.
//! Only the normalizer reads them; nothing downstream branches on shape.

mod stats;
pub mod value;

pub use stats::*;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use value::{as_key, as_timestamp, opt_count};

/// Side keys used by the source, in home/away order.
pub const SIDE_KEYS: [&str; 2] = ["faction1", "faction2"];

/// A team as embedded in a match record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTeam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl RawTeam {
    /// First usable id among `team_id`, `faction_id` and `id`.
    pub fn key(&self) -> Option<String> {
        [&self.team_id, &self.faction_id, &self.id]
            .into_iter()
            .flatten()
            .find_map(as_key)
    }

    /// `name`, falling back to `nickname`; `None` when blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.nickname.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// The two sides, keyed by faction or listed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTeams {
    List(Vec<Option<RawTeam>>),
    Sides {
        #[serde(default)]
        faction1: Option<RawTeam>,
        #[serde(default)]
        faction2: Option<RawTeam>,
    },
}

/// Result payload of a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResults {
    /// Side key (`faction1`) or team id
    #[serde(default)]
    pub winner: Option<Value>,
    /// Keyed by side key or team id
    #[serde(default, alias = "factions_score")]
    pub score: Option<BTreeMap<String, Value>>,
}

/// Nested bracket coordinates some payloads carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBracket {
    #[serde(default)]
    pub round: Option<Value>,
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub next_match_id: Option<Value>,
}

/// One match record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    #[serde(default)]
    pub match_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<Value>,
    #[serde(default)]
    pub started_at: Option<Value>,
    #[serde(default)]
    pub round: Option<Value>,
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub best_of: Option<Value>,
    #[serde(default)]
    pub next_match_id: Option<Value>,
    #[serde(default, rename = "nextMatchId")]
    pub next_match_id_camel: Option<Value>,
    #[serde(default)]
    pub bracket: Option<RawBracket>,
    #[serde(default)]
    pub teams: Option<RawTeams>,
    #[serde(default)]
    pub results: Option<RawResults>,
}

impl RawMatch {
    /// Match id from `match_id`, falling back to `id`.
    pub fn key(&self) -> Option<String> {
        [&self.match_id, &self.id]
            .into_iter()
            .flatten()
            .find_map(as_key)
    }

    /// Outgoing link from `next_match_id`, `nextMatchId` or `bracket.next_match_id`.
    pub fn next_key(&self) -> Option<String> {
        let nested = self.bracket.as_ref().and_then(|b| b.next_match_id.as_ref());
        [self.next_match_id.as_ref(), self.next_match_id_camel.as_ref(), nested]
            .into_iter()
            .flatten()
            .find_map(as_key)
    }

    /// Round from the record or its `bracket` block.
    pub fn round(&self) -> Option<u32> {
        opt_count(self.round.as_ref())
            .or_else(|| opt_count(self.bracket.as_ref().and_then(|b| b.round.as_ref())))
    }

    /// Position from the record or its `bracket` block.
    pub fn position(&self) -> Option<u32> {
        opt_count(self.position.as_ref())
            .or_else(|| opt_count(self.bracket.as_ref().and_then(|b| b.position.as_ref())))
    }

    /// Series length; zero is treated as absent.
    pub fn best_of(&self) -> Option<u32> {
        opt_count(self.best_of.as_ref()).filter(|n| *n > 0)
    }

    /// Scheduled time, falling back to the start time.
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
            .as_ref()
            .and_then(as_timestamp)
            .or_else(|| self.started_at.as_ref().and_then(as_timestamp))
    }

    /// Home and away teams, whichever shape the source used.
    pub fn sides(&self) -> [Option<&RawTeam>; 2] {
        match &self.teams {
            None => [None, None],
            Some(RawTeams::Sides { faction1, faction2 }) => [faction1.as_ref(), faction2.as_ref()],
            Some(RawTeams::List(list)) => [
                list.first().and_then(Option::as_ref),
                list.get(1).and_then(Option::as_ref),
            ],
        }
    }

    /// Builder method to attach a result payload.
    pub fn with_results(mut self, results: RawResults) -> Self {
        self.results = Some(results);
        self
    }
}

/// A record from the separate results listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub match_id: Option<Value>,
    #[serde(default)]
    pub winner: Option<Value>,
    #[serde(default)]
    pub factions_score: Option<BTreeMap<String, Value>>,
}

/// Attach results-listing records to matches that carry no result payload.
///
/// Matches that already have results keep them.
pub fn attach_results(matches: Vec<RawMatch>, results: &[RawResult]) -> Vec<RawMatch> {
    let by_id: HashMap<String, &RawResult> = results
        .iter()
        .filter_map(|r| r.match_id.as_ref().and_then(as_key).map(|id| (id, r)))
        .collect();

    matches
        .into_iter()
        .map(|raw| {
            if raw.results.is_some() {
                return raw;
            }
            match raw.key().and_then(|id| by_id.get(&id).copied()) {
                Some(result) => raw.with_results(RawResults {
                    winner: result.winner.clone(),
                    score: result.factions_score.clone(),
                }),
                None => raw,
            }
        })
        .collect()
}
