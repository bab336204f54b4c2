//! Single-elimination bracket reconstruction.
//!
//! - **builder**: links normalized matches into a tree and finds the final
//! - **rounds**: per-round views of a built tree

mod builder;
mod rounds;

pub use builder::*;
pub use rounds::*;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{Match, MatchId};

/// How matches were linked for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageStrategy {
    /// Matches carry `next_match_id`
    Explicit,
    /// Matches carry round and position only
    RoundPosition,
    /// Neither; every match stands alone
    Unlinked,
}

impl LinkageStrategy {
    /// Pick the strategy a batch supports. Batches are never mixed: a single
    /// explicit link selects the explicit strategy for every match.
    pub fn select(matches: &[Match]) -> Self {
        if matches.iter().any(|m| m.next_match_id.is_some()) {
            LinkageStrategy::Explicit
        } else if !matches.is_empty() && matches.iter().all(Match::has_supplied_coordinates) {
            LinkageStrategy::RoundPosition
        } else {
            LinkageStrategy::Unlinked
        }
    }
}

impl std::fmt::Display for LinkageStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkageStrategy::Explicit => write!(f, "explicit"),
            LinkageStrategy::RoundPosition => write!(f, "round/position"),
            LinkageStrategy::Unlinked => write!(f, "unlinked"),
        }
    }
}

/// A built bracket: an id-keyed arena of matches plus the chosen root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketTree {
    /// Id of the final, `None` only for an empty bracket
    pub root: Option<MatchId>,
    pub matches: BTreeMap<MatchId, Match>,
    pub strategy: LinkageStrategy,
    /// False when any structural problem was found
    pub valid: bool,
}

impl BracketTree {
    /// Tree of an empty batch: no root, valid.
    pub fn empty() -> Self {
        Self {
            root: None,
            matches: BTreeMap::new(),
            strategy: LinkageStrategy::Unlinked,
            valid: true,
        }
    }

    /// The final, if the tree has one.
    pub fn root_match(&self) -> Option<&Match> {
        self.root.as_ref().and_then(|id| self.matches.get(id))
    }

    /// Look up a match by id.
    pub fn get(&self, id: &MatchId) -> Option<&Match> {
        self.matches.get(id)
    }

    /// Feeder matches of `id`, in slot order.
    pub fn children(&self, id: &MatchId) -> Vec<&Match> {
        self.matches
            .get(id)
            .map(|m| {
                m.previous_match_ids
                    .iter()
                    .filter_map(|p| self.matches.get(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Matches with no outgoing link.
    pub fn roots(&self) -> Vec<&Match> {
        self.matches.values().filter(|m| m.is_root()).collect()
    }

    /// Every (child, parent) link.
    pub fn edges(&self) -> BTreeSet<(MatchId, MatchId)> {
        self.matches
            .values()
            .filter_map(|m| m.next_match_id.clone().map(|next| (m.id.clone(), next)))
            .collect()
    }

    /// Number of rounds between the first round and the root, inclusive.
    pub fn round_count(&self) -> u32 {
        self.matches
            .values()
            .map(|m| m.round.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Number of matches in the tree.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
