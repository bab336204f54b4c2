//! Per-map and aggregated match statistics models.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// One player's line on one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMapStat {
    pub player_id: PlayerId,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    /// Share of kills that were headshots (0 to 100)
    pub headshot_pct: f64,
}

impl PlayerMapStat {
    /// Create an empty stat line.
    pub fn new(player_id: PlayerId, name: String) -> Self {
        Self {
            player_id,
            name,
            kills: 0,
            deaths: 0,
            assists: 0,
            headshot_pct: 0.0,
        }
    }

    /// Builder method to set kills/deaths/assists.
    pub fn with_kda(mut self, kills: u32, deaths: u32, assists: u32) -> Self {
        self.kills = kills;
        self.deaths = deaths;
        self.assists = assists;
        self
    }

    /// Builder method to set headshot percentage, clamped to 0..=100.
    pub fn with_headshot_pct(mut self, pct: f64) -> Self {
        self.headshot_pct = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
        self
    }

    /// Headshot kills implied by the percentage.
    pub fn headshots(&self) -> f64 {
        self.kills as f64 * self.headshot_pct / 100.0
    }
}

/// One player's totals across every map of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAggregateStat {
    pub player_id: PlayerId,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    /// Kill-weighted headshot percentage (0 to 100)
    pub headshot_pct: f64,
    /// Maps this player appeared on
    pub maps_played: u32,
}

impl PlayerAggregateStat {
    /// Kill/death ratio; kills when the player never died.
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            self.kills as f64
        } else {
            self.kills as f64 / self.deaths as f64
        }
    }
}

/// One team on one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMapStat {
    /// Team id when the source provides one, otherwise its name or slot
    pub team_key: String,
    pub team_name: String,
    pub final_score: u32,
    pub players: Vec<PlayerMapStat>,
}

/// One map of a best-of-N match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStat {
    pub map_name: Option<String>,
    pub teams: Vec<TeamMapStat>,
}

impl MapStat {
    /// Key of the team with the strictly highest final score.
    pub fn winner_key(&self) -> Option<&str> {
        let best = self.teams.iter().map(|t| t.final_score).max()?;
        let mut leaders = self.teams.iter().filter(|t| t.final_score == best);
        let leader = leaders.next()?;
        if leaders.next().is_some() {
            return None;
        }
        Some(&leader.team_key)
    }
}

/// One team's totals across the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregateStat {
    pub team_key: String,
    pub team_name: String,
    /// Sum of per-map final scores
    pub final_score: u32,
    pub maps_won: u32,
    pub players: Vec<PlayerAggregateStat>,
}

/// Per-map breakdown plus the overall view of a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStatsSummary {
    pub maps: Vec<MapStat>,
    pub overall: Vec<TeamAggregateStat>,
}

impl MatchStatsSummary {
    /// Overall stats for the team with `key`.
    pub fn team(&self, key: &str) -> Option<&TeamAggregateStat> {
        self.overall.iter().find(|t| t.team_key == key)
    }

    /// Every player across both teams, sorted by kills (descending).
    pub fn players_by_kills(&self) -> Vec<&PlayerAggregateStat> {
        let mut players: Vec<_> = self.overall.iter().flat_map(|t| t.players.iter()).collect();
        players.sort_by(|a, b| b.kills.cmp(&a.kills).then_with(|| a.name.cmp(&b.name)));
        players
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(key: &str, score: u32) -> TeamMapStat {
        TeamMapStat {
            team_key: key.to_string(),
            team_name: key.to_uppercase(),
            final_score: score,
            players: vec![],
        }
    }

    #[test]
    fn test_headshot_pct_clamped() {
        let stat = PlayerMapStat::new("p1".into(), "one".to_string()).with_headshot_pct(140.0);
        assert_eq!(stat.headshot_pct, 100.0);
        let stat = PlayerMapStat::new("p1".into(), "one".to_string()).with_headshot_pct(-3.0);
        assert_eq!(stat.headshot_pct, 0.0);
        let stat = PlayerMapStat::new("p1".into(), "one".to_string()).with_headshot_pct(f64::NAN);
        assert_eq!(stat.headshot_pct, 0.0);
    }

    #[test]
    fn test_headshots_from_pct() {
        let stat = PlayerMapStat::new("p1".into(), "one".to_string())
            .with_kda(20, 10, 2)
            .with_headshot_pct(45.0);
        assert!((stat.headshots() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_map_winner_key() {
        let map = MapStat {
            map_name: Some("de_inferno".to_string()),
            teams: vec![team("a", 13), team("b", 7)],
        };
        assert_eq!(map.winner_key(), Some("a"));
    }

    #[test]
    fn test_map_winner_key_tie() {
        let map = MapStat {
            map_name: None,
            teams: vec![team("a", 12), team("b", 12)],
        };
        assert_eq!(map.winner_key(), None);
    }

    #[test]
    fn test_kd_ratio_no_deaths() {
        let stat = PlayerAggregateStat {
            player_id: "p".into(),
            name: "p".to_string(),
            kills: 7,
            deaths: 0,
            assists: 0,
            headshot_pct: 0.0,
            maps_played: 1,
        };
        assert_eq!(stat.kd_ratio(), 7.0);
    }
}
