//! Raw match record → canonical [`Match`].

use tracing::debug;

use crate::models::{
    Diagnosed, EngineError, Match, MatchFlag, MatchId, MatchState, Participant, Side,
};
use crate::raw::value::{as_count, as_key};
use crate::raw::{RawMatch, RawResults, SIDE_KEYS};

use super::TeamRegistry;

/// Register both sides of a record with the registry.
pub fn register_sides(registry: &mut TeamRegistry, raw: &RawMatch) {
    let Some(id) = raw.key() else {
        return;
    };
    for (team, side_key) in raw.sides().into_iter().zip(SIDE_KEYS) {
        registry.register(team, &[&id, side_key]);
    }
}

/// Normalizes single records against a populated registry.
pub struct MatchNormalizer<'a> {
    registry: &'a TeamRegistry,
}

impl<'a> MatchNormalizer<'a> {
    pub fn new(registry: &'a TeamRegistry) -> Self {
        Self { registry }
    }

    /// Normalize one record. `index` is its position in the batch and only
    /// used for reporting.
    ///
    /// The only hard failure is a record without an id; a finished match with
    /// no resolvable winner is returned downgraded to `Live` together with an
    /// `InconsistentWinner` diagnostic.
    pub fn normalize(&self, index: usize, raw: &RawMatch) -> Result<Diagnosed<Match>, EngineError> {
        let id = raw.key().ok_or_else(|| EngineError::MalformedRecord {
            index,
            reason: "missing match id".to_string(),
        })?;

        let [home_raw, away_raw] = raw.sides();
        let mut home = Side::new(self.registry.resolve(home_raw, &[&id, SIDE_KEYS[0]]));
        let mut away = Side::new(self.registry.resolve(away_raw, &[&id, SIDE_KEYS[1]]));

        if let Some(results) = &raw.results {
            home.score = Some(side_score(results, 0, &home.participant));
            away.score = Some(side_score(results, 1, &away.participant));
        }

        let winner = raw
            .results
            .as_ref()
            .and_then(|r| r.winner.as_ref())
            .and_then(as_key)
            .and_then(|w| winner_slot(&w, &home.participant, &away.participant));

        let match_id = MatchId::from(id);
        let reported = MatchState::from_status(raw.status.as_deref());
        let mut diagnostics = Vec::new();
        let mut flags = Vec::new();

        let state = match (home.is_placeholder(), away.is_placeholder()) {
            (false, true) | (true, false) => {
                home.is_winner = !home.is_placeholder();
                away.is_winner = !away.is_placeholder();
                flags.push(MatchFlag::Bye);
                debug!("Match {} is a bye", match_id);
                MatchState::Complete
            }
            (true, true) => MatchState::Pending,
            (false, false) => {
                if let Some(slot) = winner {
                    home.is_winner = slot == 0;
                    away.is_winner = slot == 1;
                }
                match reported {
                    MatchState::Complete if winner.is_none() => {
                        let err = EngineError::InconsistentWinner(match_id.clone());
                        diagnostics.push(err.into());
                        flags.push(MatchFlag::WinnerUnresolved);
                        MatchState::Live
                    }
                    MatchState::Pending => MatchState::Scheduled,
                    other => other,
                }
            }
        };

        let mut normalized = Match::new(match_id, home, away, state)
            .with_name(raw.name.clone())
            .with_scheduled_at(raw.scheduled_at())
            .with_best_of(raw.best_of())
            .with_next(raw.next_key().map(MatchId::from));

        if let Some(round) = raw.round() {
            normalized = normalized.with_coordinates(round, raw.position().unwrap_or(0));
        }
        for flag in flags {
            normalized = normalized.with_flag(flag);
        }

        Ok(Diagnosed::new(normalized, diagnostics))
    }
}

/// Score for one side, looked up by side key then team id; 0 when absent.
fn side_score(results: &RawResults, slot: usize, participant: &Participant) -> u32 {
    let Some(score) = &results.score else {
        return 0;
    };
    score
        .get(SIDE_KEYS[slot])
        .or_else(|| score.get(participant.id().as_str()))
        .and_then(|v| as_count(v).ok())
        .unwrap_or(0)
}

/// Which side a raw winner value names, by side key or team id.
fn winner_slot(winner: &str, home: &Participant, away: &Participant) -> Option<usize> {
    if winner == SIDE_KEYS[0] {
        return Some(0);
    }
    if winner == SIDE_KEYS[1] {
        return Some(1);
    }
    [home, away]
        .iter()
        .position(|p| !p.is_placeholder() && p.id().as_str() == winner)
}
