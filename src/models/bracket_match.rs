//! Canonical match model: one node of the bracket.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, MatchState, Participant};

/// One of the two competing slots in a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub participant: Participant,

    /// Maps (or points) won; absent when the source has no result payload
    pub score: Option<u32>,

    pub is_winner: bool,
}

impl Side {
    /// Side held by `participant`, no score, not the winner.
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            score: None,
            is_winner: false,
        }
    }

    /// True when the slot is not yet occupied by a real team.
    pub fn is_placeholder(&self) -> bool {
        self.participant.is_placeholder()
    }
}

/// Whether `round`/`position` came from the source or still need deriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coordinates {
    Supplied,
    Derived,
}

/// Conditions worth surfacing to a consumer alongside the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFlag {
    /// One side advanced without an opponent
    Bye,
    /// Source said finished but no winner could be resolved
    WinnerUnresolved,
    /// Only one feeder match links into this one
    HalfLinked,
}

/// A normalized match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,

    /// Source display name, if any
    pub name: Option<String>,

    pub home: Side,
    pub away: Side,

    pub scheduled_at: Option<DateTime<Utc>>,

    pub state: MatchState,

    /// 0-based elimination stage
    pub round: u32,

    /// Index within the round
    pub position: u32,

    pub coordinates: Coordinates,

    /// Match the winner advances to; `None` for the final
    pub next_match_id: Option<MatchId>,

    /// Feeder matches, empty for the first round
    pub previous_match_ids: Vec<MatchId>,

    pub best_of: Option<u32>,

    pub flags: BTreeSet<MatchFlag>,
}

impl Match {
    /// Create a match with no schedule, linkage or coordinates.
    pub fn new(id: MatchId, home: Side, away: Side, state: MatchState) -> Self {
        Self {
            id,
            name: None,
            home,
            away,
            scheduled_at: None,
            state,
            round: 0,
            position: 0,
            coordinates: Coordinates::Derived,
            next_match_id: None,
            previous_match_ids: Vec::new(),
            best_of: None,
            flags: BTreeSet::new(),
        }
    }

    /// Builder method to set source coordinates.
    pub fn with_coordinates(mut self, round: u32, position: u32) -> Self {
        self.round = round;
        self.position = position;
        self.coordinates = Coordinates::Supplied;
        self
    }

    /// Builder method to set the outgoing link.
    pub fn with_next(mut self, next: Option<MatchId>) -> Self {
        self.next_match_id = next;
        self
    }

    /// Builder method to set the scheduled time.
    pub fn with_scheduled_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.scheduled_at = at;
        self
    }

    /// Builder method to set the display name.
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Builder method to set the series length.
    pub fn with_best_of(mut self, best_of: Option<u32>) -> Self {
        self.best_of = best_of;
        self
    }

    /// Builder method to add a flag.
    pub fn with_flag(mut self, flag: MatchFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Check whether `flag` is set.
    pub fn has_flag(&self, flag: MatchFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// True when round and position came from the source.
    pub fn has_supplied_coordinates(&self) -> bool {
        self.coordinates == Coordinates::Supplied
    }

    /// The winning side, if one is marked.
    pub fn winner(&self) -> Option<&Side> {
        if self.home.is_winner {
            Some(&self.home)
        } else if self.away.is_winner {
            Some(&self.away)
        } else {
            None
        }
    }

    /// True when no outgoing link is set.
    pub fn is_root(&self) -> bool {
        self.next_match_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, Team};

    fn side(id: &str, name: &str) -> Side {
        Side::new(Participant::Team(Team::new(id.into(), name.to_string())))
    }

    #[test]
    fn test_new_match_defaults() {
        let m = Match::new(
            EntityId::from("m1"),
            side("a", "Alpha"),
            side("b", "Bravo"),
            MatchState::Scheduled,
        );
        assert_eq!(m.round, 0);
        assert_eq!(m.coordinates, Coordinates::Derived);
        assert!(m.is_root());
        assert!(m.previous_match_ids.is_empty());
        assert!(m.winner().is_none());
    }

    #[test]
    fn test_with_coordinates_marks_supplied() {
        let m = Match::new(
            EntityId::from("m1"),
            side("a", "Alpha"),
            side("b", "Bravo"),
            MatchState::Scheduled,
        )
        .with_coordinates(2, 1);
        assert!(m.has_supplied_coordinates());
        assert_eq!((m.round, m.position), (2, 1));
    }

    #[test]
    fn test_winner_lookup() {
        let mut away = side("b", "Bravo");
        away.is_winner = true;
        let m = Match::new(EntityId::from("m1"), side("a", "Alpha"), away, MatchState::Complete);
        assert_eq!(m.winner().unwrap().participant.id().as_str(), "b");
    }

    #[test]
    fn test_flags_serialize_snake_case() {
        let m = Match::new(
            EntityId::from("m1"),
            side("a", "Alpha"),
            side("b", "Bravo"),
            MatchState::Live,
        )
        .with_flag(MatchFlag::WinnerUnresolved);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["flags"][0], "winner_unresolved");
        assert_eq!(json["state"], "live");
    }
}
