//! Raw per-map match statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value::as_key;

/// Stat keys as the source spells them.
pub const KILLS: &str = "Kills";
pub const DEATHS: &str = "Deaths";
pub const ASSISTS: &str = "Assists";
pub const HEADSHOT_PCT: &str = "Headshots %";
pub const HEADSHOTS: &str = "Headshots";

const FINAL_SCORE_KEYS: [&str; 2] = ["FinalScore", "Final Score"];

/// Statistics document for one match; each entry of `rounds` is one map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatchStats {
    #[serde(default)]
    pub rounds: Vec<RawMapRound>,
}

/// One map played.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMapRound {
    #[serde(default)]
    pub round_stats: BTreeMap<String, Value>,
    #[serde(default)]
    pub teams: Vec<RawTeamStats>,
}

impl RawMapRound {
    /// Map name from the `Map` round stat.
    pub fn map_name(&self) -> Option<String> {
        self.round_stats.get("Map").and_then(as_key)
    }
}

/// One team's block on one map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTeamStats {
    #[serde(default)]
    pub team_id: Option<Value>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_stats: BTreeMap<String, Value>,
    #[serde(default)]
    pub players: Vec<RawPlayerStats>,
}

impl RawTeamStats {
    pub fn key(&self) -> Option<String> {
        self.team_id.as_ref().and_then(as_key)
    }

    /// `team_name`, falling back to the `Team` stat.
    pub fn name(&self) -> Option<String> {
        self.team_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.team_stats.get("Team").and_then(as_key))
    }

    /// Raw `FinalScore` (or `Final Score`) value.
    pub fn final_score(&self) -> Option<&Value> {
        FINAL_SCORE_KEYS.iter().find_map(|k| self.team_stats.get(*k))
    }
}

/// One player's row on one map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlayerStats {
    #[serde(default)]
    pub player_id: Option<Value>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub player_stats: BTreeMap<String, Value>,
}

impl RawPlayerStats {
    pub fn key(&self) -> Option<String> {
        self.player_id.as_ref().and_then(as_key)
    }

    /// Raw value of one player stat.
    pub fn stat(&self, name: &str) -> Option<&Value> {
        self.player_stats.get(name)
    }
}
