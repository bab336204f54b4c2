//! Round grouping and labels.

use std::collections::BTreeMap;

use super::BracketTree;
use crate::models::{round_label, Match, RoundGroup};

/// Per-round view of a built tree.
///
/// Rounds ascend by index and matches ascend by position. An empty tree
/// (no root) yields no rounds: an unseeded tournament is a normal state.
pub fn group(tree: &BracketTree) -> Vec<RoundGroup> {
    if tree.root.is_none() {
        return Vec::new();
    }

    let total = tree.round_count();
    let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
    for m in tree.matches.values() {
        rounds.entry(m.round).or_default().push(m.clone());
    }

    rounds
        .into_iter()
        .map(|(index, mut matches)| {
            sort_by_position(&mut matches);
            RoundGroup {
                index,
                label: round_label(index, total),
                matches,
            }
        })
        .collect()
}

/// Flat grouping by the matches' own round numbers, without building a tree.
///
/// Indices are ordinal: the lowest round present is index 0 whatever number
/// the source gave it.
pub fn group_by_round(matches: &[Match]) -> Vec<RoundGroup> {
    let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
    for m in matches {
        rounds.entry(m.round).or_default().push(m.clone());
    }

    let total = rounds.len() as u32;
    rounds
        .into_values()
        .enumerate()
        .map(|(index, mut matches)| {
            sort_by_position(&mut matches);
            let index = index as u32;
            RoundGroup {
                index,
                label: round_label(index, total),
                matches,
            }
        })
        .collect()
}

fn sort_by_position(matches: &mut [Match]) {
    matches.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
}
