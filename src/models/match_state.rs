//! Match lifecycle state.

use serde::{Deserialize, Serialize};

/// Where a match is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    /// A participant slot is not yet determined
    Pending,
    /// Both participants known, not started
    Scheduled,
    /// In progress
    Live,
    /// Finished, winner known
    Complete,
}

impl MatchState {
    /// Map a source status string onto a state.
    ///
    /// Unknown and absent statuses map to `Pending`; the normalizer refines
    /// that once it knows who occupies each side.
    pub fn from_status(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return MatchState::Pending;
        };
        match status.trim().to_ascii_lowercase().as_str() {
            "finished" => MatchState::Complete,
            "ongoing" | "running" => MatchState::Live,
            "ready" | "scheduled" => MatchState::Scheduled,
            _ => MatchState::Pending,
        }
    }

    /// True once a winner is known.
    pub fn is_finished(&self) -> bool {
        matches!(self, MatchState::Complete)
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchState::Pending => write!(f, "pending"),
            MatchState::Scheduled => write!(f, "scheduled"),
            MatchState::Live => write!(f, "live"),
            MatchState::Complete => write!(f, "complete"),
        }
    }
}
