//! Statistics aggregation.
//!
//! Merges per-map player and team statistics into match-level totals:
//! - kills, deaths and assists are summed
//! - headshot percentage is weighted by kills (total headshots / total kills),
//!   never averaged or maxed across maps
//! - team final scores are summed

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    Diagnosed, Diagnostic, EngineError, MapStat, MatchStatsSummary, PlayerAggregateStat,
    PlayerId, PlayerMapStat, TeamAggregateStat, TeamMapStat,
};
use crate::raw::value::{as_count, as_number};
use crate::raw::{RawMatchStats, RawPlayerStats, ASSISTS, DEATHS, HEADSHOTS, HEADSHOT_PCT, KILLS};

/// Kill-weighted headshot percentage over `(kills, headshot_pct)` pairs.
///
/// Returns 0 when there are no kills.
pub fn weighted_headshot_pct(samples: &[(u32, f64)]) -> f64 {
    let kills: u64 = samples.iter().map(|(k, _)| *k as u64).sum();
    if kills == 0 {
        return 0.0;
    }
    let headshots: f64 = samples.iter().map(|(k, pct)| *k as f64 * pct / 100.0).sum();
    100.0 * headshots / kills as f64
}

/// Sum of per-map final scores, saturating at `u32::MAX`.
pub fn aggregate_final_scores(scores: &[u32]) -> u32 {
    clamp(scores.iter().map(|s| u64::from(*s)).sum())
}

fn clamp(total: u64) -> u32 {
    u32::try_from(total).unwrap_or(u32::MAX)
}

#[derive(Default)]
struct Accumulator {
    name: String,
    kills: u64,
    deaths: u64,
    assists: u64,
    headshots: f64,
    maps_played: u32,
}

/// Merge per-map player lines into per-player totals.
///
/// `per_map` is ordered by map-played order; each inner slice lists every
/// player on that map. Output follows first appearance. A player missing from
/// a map contributes nothing for it.
pub fn aggregate(per_map: &[Vec<PlayerMapStat>]) -> Vec<PlayerAggregateStat> {
    let mut order: Vec<PlayerId> = Vec::new();
    let mut totals: HashMap<PlayerId, Accumulator> = HashMap::new();

    for map in per_map {
        for stat in map {
            let acc = totals.entry(stat.player_id.clone()).or_insert_with(|| {
                order.push(stat.player_id.clone());
                Accumulator {
                    name: stat.name.clone(),
                    ..Default::default()
                }
            });
            acc.kills += u64::from(stat.kills);
            acc.deaths += u64::from(stat.deaths);
            acc.assists += u64::from(stat.assists);
            acc.headshots += stat.headshots();
            acc.maps_played += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|id| {
            let acc = totals.remove(&id)?;
            let headshot_pct = if acc.kills == 0 {
                0.0
            } else {
                100.0 * acc.headshots / acc.kills as f64
            };
            Some(PlayerAggregateStat {
                player_id: id,
                name: acc.name,
                kills: clamp(acc.kills),
                deaths: clamp(acc.deaths),
                assists: clamp(acc.assists),
                headshot_pct,
                maps_played: acc.maps_played,
            })
        })
        .collect()
}

/// Build the per-map and overall views of a raw statistics document.
pub fn summarize(raw: &RawMatchStats) -> Diagnosed<MatchStatsSummary> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut maps = Vec::with_capacity(raw.rounds.len());
    let mut row = 0usize;

    for round in &raw.rounds {
        let teams = round
            .teams
            .iter()
            .enumerate()
            .map(|(slot, team)| {
                let team_name = team.name().unwrap_or_else(|| format!("Team {}", slot + 1));
                let team_key = team
                    .key()
                    .or_else(|| team.name())
                    .unwrap_or_else(|| format!("team-{}", slot + 1));
                let final_score = match team.final_score() {
                    Some(v) => coerce_count(v, "FinalScore", row, &mut diagnostics),
                    None => 0,
                };

                let players = team
                    .players
                    .iter()
                    .filter_map(|p| {
                        let stat = player_line(p, row, &mut diagnostics);
                        row += 1;
                        stat
                    })
                    .collect();

                TeamMapStat {
                    team_key,
                    team_name,
                    final_score,
                    players,
                }
            })
            .collect();

        maps.push(MapStat {
            map_name: round.map_name(),
            teams,
        });
    }

    let overall = overall_by_team(&maps);
    debug!(
        "Summarized {} maps for {} teams",
        maps.len(),
        overall.len()
    );

    Diagnosed::new(MatchStatsSummary { maps, overall }, diagnostics)
}

/// One player row; `None` (and a diagnostic) when it has no player id.
fn player_line(
    raw: &RawPlayerStats,
    row: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<PlayerMapStat> {
    let Some(id) = raw.key() else {
        warn!("Skipping player row {} without player_id", row);
        diagnostics.push(
            EngineError::MalformedRecord {
                index: row,
                reason: "player row without player_id".to_string(),
            }
            .into(),
        );
        return None;
    };

    let mut count = |key: &str| match raw.stat(key) {
        Some(v) => coerce_count(v, key, row, diagnostics),
        None => 0,
    };
    let kills = count(KILLS);
    let deaths = count(DEATHS);
    let assists = count(ASSISTS);

    let headshot_pct = match (raw.stat(HEADSHOT_PCT), raw.stat(HEADSHOTS)) {
        (Some(pct), _) => as_number(pct).unwrap_or_else(|reason| {
            diagnostics.push(coercion_error(row, HEADSHOT_PCT, &reason));
            0.0
        }),
        (None, Some(headshots)) if kills > 0 => {
            let headshots = coerce_count(headshots, HEADSHOTS, row, diagnostics);
            100.0 * headshots as f64 / kills as f64
        }
        _ => 0.0,
    };

    let name = raw.nickname.clone().unwrap_or_else(|| id.clone());
    Some(
        PlayerMapStat::new(PlayerId::from(id), name)
            .with_kda(kills, deaths, assists)
            .with_headshot_pct(headshot_pct),
    )
}

/// Coerce a count, reporting and zeroing values that are not numeric.
fn coerce_count(value: &Value, field: &str, row: usize, diagnostics: &mut Vec<Diagnostic>) -> u32 {
    as_count(value).unwrap_or_else(|reason| {
        diagnostics.push(coercion_error(row, field, &reason));
        0
    })
}

fn coercion_error(row: usize, field: &str, reason: &str) -> Diagnostic {
    warn!("Row {}: {} {}, using 0", row, field, reason);
    EngineError::MalformedRecord {
        index: row,
        reason: format!("{}: {}, coerced to 0", field, reason),
    }
    .into()
}

/// Merge each team's maps, keyed by team key in first-appearance order.
fn overall_by_team(maps: &[MapStat]) -> Vec<TeamAggregateStat> {
    let mut order: Vec<String> = Vec::new();
    let mut names: HashMap<String, String> = HashMap::new();
    let mut scores: HashMap<String, Vec<u32>> = HashMap::new();
    let mut lines: HashMap<String, Vec<Vec<PlayerMapStat>>> = HashMap::new();
    let mut wins: HashMap<String, u32> = HashMap::new();

    for map in maps {
        if let Some(winner) = map.winner_key() {
            *wins.entry(winner.to_string()).or_default() += 1;
        }
        for team in &map.teams {
            if !names.contains_key(&team.team_key) {
                order.push(team.team_key.clone());
                names.insert(team.team_key.clone(), team.team_name.clone());
            }
            scores
                .entry(team.team_key.clone())
                .or_default()
                .push(team.final_score);
            lines
                .entry(team.team_key.clone())
                .or_default()
                .push(team.players.clone());
        }
    }

    order
        .into_iter()
        .map(|key| TeamAggregateStat {
            team_name: names.remove(&key).unwrap_or_default(),
            final_score: aggregate_final_scores(&scores.remove(&key).unwrap_or_default()),
            maps_won: wins.get(&key).copied().unwrap_or(0),
            players: aggregate(&lines.remove(&key).unwrap_or_default()),
            team_key: key,
        })
        .collect()
}
