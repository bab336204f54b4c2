//! Per-round view of a bracket.

use serde::{Deserialize, Serialize};

use super::Match;

/// Matches of one elimination stage, ordered by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundGroup {
    pub index: u32,
    pub label: String,
    pub matches: Vec<Match>,
}

/// Human label for a round given how many rounds the bracket has.
pub fn round_label(index: u32, total_rounds: u32) -> String {
    let from_end = total_rounds.saturating_sub(index);
    match from_end {
        1 => "Final".to_string(),
        2 => "Semifinal".to_string(),
        3 => "Quarterfinal".to_string(),
        _ => format!("Round {}", u64::from(index) + 1),
    }
}
