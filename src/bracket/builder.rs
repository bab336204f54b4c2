//! Bracket tree builder.
//!
//! Matches are held in an index arena (`Vec<Match>` plus id → index map) and
//! linked through index vectors; the final [`BracketTree`] is assembled in one
//! pass at the end, so no match is ever patched in place.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, warn};

use super::{BracketTree, LinkageStrategy};
use crate::models::{Diagnosed, Diagnostic, DiagnosticKind, EngineError, Match, MatchFlag, MatchId};

/// Link normalized matches into a bracket.
///
/// Never fails: structural problems are reported as diagnostics and the tree
/// is marked invalid, because partial tournament data is the common case.
pub fn build(matches: &[Match]) -> Diagnosed<BracketTree> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let nodes = dedupe(matches, &mut diagnostics);

    if nodes.is_empty() {
        return Diagnosed::new(BracketTree::empty(), diagnostics);
    }

    let strategy = LinkageStrategy::select(&nodes);
    debug!("Building bracket of {} matches using {} linkage", nodes.len(), strategy);

    let mut arena = Arena::new(nodes);
    match strategy {
        LinkageStrategy::Explicit => arena.link_explicit(&mut diagnostics),
        LinkageStrategy::RoundPosition => arena.link_by_coordinates(&mut diagnostics),
        LinkageStrategy::Unlinked => arena.place_unlinked(),
    }

    let root = arena.select_root(&mut diagnostics);
    arena.check_feeders(&mut diagnostics);

    let valid = diagnostics
        .iter()
        .all(|d| d.kind == DiagnosticKind::DuplicateId);
    let tree = arena.into_tree(root, strategy, valid);

    info!(
        "Built bracket: {} matches, {} rounds, root {:?}, valid {}",
        tree.len(),
        tree.round_count(),
        tree.root.as_ref().map(MatchId::as_str),
        tree.valid
    );

    Diagnosed::new(tree, diagnostics)
}

/// Keep the first match for each id.
fn dedupe(matches: &[Match], diagnostics: &mut Vec<Diagnostic>) -> Vec<Match> {
    let mut seen: HashSet<&MatchId> = HashSet::new();
    let mut unique = Vec::with_capacity(matches.len());
    for m in matches {
        if seen.insert(&m.id) {
            unique.push(m.clone());
        } else {
            warn!("Dropping duplicate match {}", m.id);
            diagnostics.push(EngineError::DuplicateId(m.id.clone()).into());
        }
    }
    unique
}

struct Arena {
    nodes: Vec<Match>,
    index: HashMap<MatchId, usize>,
    next: Vec<Option<usize>>,
    round: Vec<u32>,
    position: Vec<u32>,
}

impl Arena {
    fn new(nodes: Vec<Match>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        let round = nodes.iter().map(|m| m.round).collect();
        let position = nodes.iter().map(|m| m.position).collect();
        Self {
            next: vec![None; nodes.len()],
            nodes,
            index,
            round,
            position,
        }
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn id(&self, i: usize) -> &MatchId {
        &self.nodes[i].id
    }

    /// Root precedence: highest round, then lowest position, then lowest id.
    fn precedence(&self, a: usize, b: usize) -> Ordering {
        self.round[b]
            .cmp(&self.round[a])
            .then(self.position[a].cmp(&self.position[b]))
            .then_with(|| self.id(a).cmp(self.id(b)))
    }

    /// Feeders of every node, ordered by position then id.
    fn children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.len()];
        for (i, next) in self.next.iter().enumerate() {
            if let Some(j) = next {
                children[*j].push(i);
            }
        }
        for feeders in &mut children {
            feeders.sort_by(|a, b| {
                self.position[*a]
                    .cmp(&self.position[*b])
                    .then_with(|| self.id(*a).cmp(self.id(*b)))
            });
        }
        children
    }

    /// Subtree of `start`, each parent before its feeders.
    fn preorder(start: usize, children: &[Vec<usize>]) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(children[node].iter().rev());
        }
        order
    }

    fn link_explicit(&mut self, diagnostics: &mut Vec<Diagnostic>) {
        for i in 0..self.len() {
            let Some(target) = self.nodes[i].next_match_id.clone() else {
                continue;
            };
            match self.index.get(&target) {
                Some(&j) if j != i => self.next[i] = Some(j),
                _ => {
                    warn!("Match {} links to unknown match {}", self.id(i), target);
                    diagnostics.push(
                        EngineError::DanglingLink {
                            from: self.id(i).clone(),
                            to: target,
                        }
                        .into(),
                    );
                }
            }
        }

        for (j, feeders) in self.children().into_iter().enumerate() {
            if feeders.len() > 2 {
                warn!("Match {} has {} feeders", self.id(j), feeders.len());
                diagnostics.push(
                    EngineError::InvalidFeeders {
                        match_id: self.id(j).clone(),
                        count: feeders.len(),
                    }
                    .into(),
                );
                for &extra in &feeders[2..] {
                    self.next[extra] = None;
                }
            }
        }

        self.break_cycles(diagnostics);

        if self.nodes.iter().all(Match::has_supplied_coordinates) {
            self.reindex_supplied();
        } else {
            self.derive_from_linkage();
        }
    }

    /// Sever one link per cycle so every node drains into a root.
    fn break_cycles(&mut self, diagnostics: &mut Vec<Diagnostic>) {
        loop {
            let children = self.children();
            let mut reachable = vec![false; self.len()];
            for root in (0..self.len()).filter(|i| self.next[*i].is_none()) {
                for node in Self::preorder(root, &children) {
                    reachable[node] = true;
                }
            }

            let on_cycle: Vec<usize> = (0..self.len())
                .filter(|&i| !reachable[i] && self.returns_to_self(i))
                .collect();
            let Some(cut) = on_cycle.into_iter().min_by(|a, b| self.precedence(*a, *b)) else {
                break;
            };

            warn!("Cycle through match {}, cutting its outgoing link", self.id(cut));
            diagnostics.push(
                EngineError::AmbiguousBracket {
                    candidates: 0,
                    chosen: self.id(cut).clone(),
                }
                .into(),
            );
            self.next[cut] = None;
        }
    }

    fn returns_to_self(&self, start: usize) -> bool {
        let mut current = self.next[start];
        for _ in 0..self.len() {
            match current {
                Some(node) if node == start => return true,
                Some(node) => current = self.next[node],
                None => return false,
            }
        }
        false
    }

    /// Rebase rounds to start at 0 and renumber positions 0..n per round.
    fn reindex_supplied(&mut self) {
        let min = self.round.iter().copied().min().unwrap_or(0);
        for round in &mut self.round {
            *round -= min;
        }
        for members in self.groups().into_values() {
            for (p, i) in members.into_iter().enumerate() {
                self.position[i] = p as u32;
            }
        }
    }

    /// Node indices per round, each ordered by position then id.
    fn groups(&self) -> BTreeMap<u32, Vec<usize>> {
        let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for i in 0..self.len() {
            groups.entry(self.round[i]).or_default().push(i);
        }
        for members in groups.values_mut() {
            members.sort_by(|a, b| {
                self.position[*a]
                    .cmp(&self.position[*b])
                    .then_with(|| self.id(*a).cmp(self.id(*b)))
            });
        }
        groups
    }

    /// Rounds from subtree height. Positions number each round left to right,
    /// walking roots tallest first and feeders in slot order.
    fn derive_from_linkage(&mut self) {
        let children = self.children();
        let mut roots: Vec<usize> = (0..self.len()).filter(|i| self.next[*i].is_none()).collect();

        let mut height = vec![0u32; self.len()];
        for &root in &roots {
            for node in Self::preorder(root, &children).into_iter().rev() {
                height[node] = children[node]
                    .iter()
                    .map(|c| height[*c] + 1)
                    .max()
                    .unwrap_or(0);
            }
        }

        roots.sort_by(|a, b| {
            height[*b]
                .cmp(&height[*a])
                .then_with(|| self.id(*a).cmp(self.id(*b)))
        });

        let mut next_position: HashMap<u32, u32> = HashMap::new();
        for &root in &roots {
            self.round[root] = height[root];
            for node in Self::preorder(root, &children) {
                for &child in &children[node] {
                    self.round[child] = self.round[node].saturating_sub(1);
                }
                let position = next_position.entry(self.round[node]).or_insert(0);
                self.position[node] = *position;
                *position += 1;
            }
        }
    }

    /// Link `(r, p)` to `(r + 1, p / 2)` and check each round is half the
    /// size of the one before it, rounded up. Only rounds that hold matches
    /// are visited; a gap is reported once and left unlinked.
    fn link_by_coordinates(&mut self, diagnostics: &mut Vec<Diagnostic>) {
        self.reindex_supplied();
        let rounds: Vec<(u32, Vec<usize>)> = self.groups().into_iter().collect();

        for pair in rounds.windows(2) {
            let (r, current) = &pair[0];
            let (next, following) = &pair[1];
            let expected = current.len().div_ceil(2);

            if *next != r + 1 {
                warn!("Rounds {} to {} hold no matches", r + 1, next - 1);
                diagnostics.push(
                    EngineError::InconsistentRoundSizes {
                        round: r + 1,
                        expected,
                        found: 0,
                    }
                    .into(),
                );
                continue;
            }

            if following.len() != expected {
                warn!(
                    "Round {} has {} matches, expected {}",
                    next,
                    following.len(),
                    expected
                );
                diagnostics.push(
                    EngineError::InconsistentRoundSizes {
                        round: *next,
                        expected,
                        found: following.len(),
                    }
                    .into(),
                );
            }

            for (p, &i) in current.iter().enumerate() {
                if let Some(&j) = following.get(p / 2) {
                    self.next[i] = Some(j);
                }
            }
        }
    }

    /// Without linkage keep supplied coordinates; others take input order.
    fn place_unlinked(&mut self) {
        for i in 0..self.len() {
            if !self.nodes[i].has_supplied_coordinates() {
                self.position[i] = i as u32;
            }
        }
    }

    fn select_root(&self, diagnostics: &mut Vec<Diagnostic>) -> Option<usize> {
        let roots: Vec<usize> = (0..self.len()).filter(|i| self.next[*i].is_none()).collect();
        let chosen = roots.iter().copied().min_by(|a, b| self.precedence(*a, *b))?;

        if roots.len() > 1 {
            warn!(
                "{} root candidates, choosing {}",
                roots.len(),
                self.id(chosen)
            );
            diagnostics.push(
                EngineError::AmbiguousBracket {
                    candidates: roots.len(),
                    chosen: self.id(chosen).clone(),
                }
                .into(),
            );
        }
        Some(chosen)
    }

    fn check_feeders(&self, diagnostics: &mut Vec<Diagnostic>) {
        for (j, feeders) in self.children().iter().enumerate() {
            if feeders.len() == 1 {
                debug!("Match {} has a single feeder", self.id(j));
                diagnostics.push(
                    EngineError::InvalidFeeders {
                        match_id: self.id(j).clone(),
                        count: 1,
                    }
                    .into(),
                );
            }
        }
    }

    fn into_tree(self, root: Option<usize>, strategy: LinkageStrategy, valid: bool) -> BracketTree {
        let children = self.children();
        let root = root.map(|i| self.id(i).clone());

        let mut matches = BTreeMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let mut built = node.clone();
            built.round = self.round[i];
            built.position = self.position[i];
            built.next_match_id = self.next[i].map(|j| self.id(j).clone());
            built.previous_match_ids = children[i].iter().map(|c| self.id(*c).clone()).collect();
            if children[i].len() == 1 {
                built.flags.insert(MatchFlag::HalfLinked);
            }
            matches.insert(built.id.clone(), built);
        }

        BracketTree {
            root,
            matches,
            strategy,
            valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, MatchState, Participant, Side, Team};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn node(id: &str) -> Match {
        let side = |n: &str| Side::new(Participant::Team(Team::new(n.into(), n.to_string())));
        Match::new(
            id.into(),
            side(&format!("{}-home", id)),
            side(&format!("{}-away", id)),
            MatchState::Scheduled,
        )
    }

    fn linked(id: &str, next: Option<&str>) -> Match {
        node(id).with_next(next.map(EntityId::from))
    }

    fn at(id: &str, round: u32, position: u32) -> Match {
        node(id).with_coordinates(round, position)
    }

    /// 8 teams: quarterfinals q1..q4, semifinals s1, s2, final f.
    fn eight_team_explicit() -> Vec<Match> {
        vec![
            linked("q1", Some("s1")),
            linked("q2", Some("s1")),
            linked("q3", Some("s2")),
            linked("q4", Some("s2")),
            linked("s1", Some("f")),
            linked("s2", Some("f")),
            linked("f", None),
        ]
    }

    fn eight_team_coordinates() -> Vec<Match> {
        // 1-based rounds and positions, shuffled, as the source sends them
        vec![
            at("f", 3, 1),
            at("q3", 1, 3),
            at("s2", 2, 2),
            at("q1", 1, 1),
            at("q4", 1, 4),
            at("s1", 2, 1),
            at("q2", 1, 2),
        ]
    }

    fn edge_set(tree: &BracketTree) -> BTreeSet<(String, String)> {
        tree.edges()
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    fn bracket_of(first_round: u32) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut size = first_round;
        let mut round = 0;
        while size >= 1 {
            for p in 0..size {
                matches.push(at(&format!("r{}p{}", round, p), round, p));
            }
            if size == 1 {
                break;
            }
            size /= 2;
            round += 1;
        }
        matches
    }

    #[test]
    fn test_empty_input() {
        let out = build(&[]);
        assert!(out.data.root.is_none());
        assert!(out.data.matches.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_explicit_linkage() {
        let out = build(&eight_team_explicit());
        let tree = &out.data;
        assert_eq!(tree.strategy, LinkageStrategy::Explicit);
        assert_eq!(tree.root.as_ref().map(MatchId::as_str), Some("f"));
        assert!(tree.valid);
        assert!(out.diagnostics.is_empty());

        let f = tree.root_match().unwrap();
        assert_eq!(f.previous_match_ids, vec![MatchId::from("s1"), MatchId::from("s2")]);
        assert_eq!(f.round, 2);
        let s2 = tree.get(&"s2".into()).unwrap();
        assert_eq!((s2.round, s2.position), (1, 1));
        let q3 = tree.get(&"q3".into()).unwrap();
        assert_eq!((q3.round, q3.position), (0, 2));
        assert!(q3.previous_match_ids.is_empty());
    }

    #[test]
    fn test_round_position_linkage() {
        let out = build(&eight_team_coordinates());
        let tree = &out.data;
        assert_eq!(tree.strategy, LinkageStrategy::RoundPosition);
        assert_eq!(tree.root.as_ref().map(MatchId::as_str), Some("f"));
        assert!(tree.valid);

        let q4 = tree.get(&"q4".into()).unwrap();
        assert_eq!((q4.round, q4.position), (0, 3));
        assert_eq!(q4.next_match_id, Some(MatchId::from("s2")));
    }

    #[test]
    fn test_linkage_strategies_agree() {
        let explicit = build(&eight_team_explicit());
        let coordinates = build(&eight_team_coordinates());
        assert_eq!(edge_set(&explicit.data), edge_set(&coordinates.data));
        assert_eq!(explicit.data.root, coordinates.data.root);
        assert_ne!(explicit.data.strategy, coordinates.data.strategy);
    }

    #[test]
    fn test_build_is_idempotent() {
        let input = eight_team_coordinates();
        let first = build(&input);
        let second = build(&input);
        assert_eq!(first.data, second.data);
    }

    #[test]
    fn test_single_root_for_valid_brackets() {
        for size in [1, 2, 4, 8, 16] {
            let tree = build(&bracket_of(size)).data;
            assert!(tree.valid, "bracket of {} should be valid", size);
            assert_eq!(tree.roots().len(), 1);
            assert_eq!(tree.len() as u32, size * 2 - 1);
        }
    }

    #[test]
    fn test_inconsistent_round_sizes() {
        let matches = vec![
            at("a", 0, 0),
            at("b", 0, 1),
            at("c", 0, 2),
            at("d", 0, 3),
            at("s", 1, 0),
            at("f", 2, 0),
        ];
        let out = build(&matches);
        assert!(!out.data.valid);
        assert!(out.has(DiagnosticKind::InconsistentRoundSizes));
        // partial tree still built: a, b -> s; c, d unlinked
        let s = out.data.get(&"s".into()).unwrap();
        assert_eq!(s.previous_match_ids.len(), 2);
        assert_eq!(out.data.get(&"c".into()).unwrap().next_match_id, None);
        assert_eq!(out.data.root.as_ref().map(MatchId::as_str), Some("f"));
        assert!(out.has(DiagnosticKind::AmbiguousBracket));
    }

    #[test]
    fn test_missing_round_reported() {
        let matches = vec![at("a", 0, 0), at("b", 0, 1), at("f", 2, 0)];
        let out = build(&matches);
        assert!(out.has(DiagnosticKind::InconsistentRoundSizes));
        assert!(!out.data.valid);
    }

    #[test]
    fn test_partial_batch_prefers_highest_round() {
        // Only the first round is known: four roots.
        let matches = vec![at("a", 0, 1), at("b", 0, 0), at("c", 0, 2), at("d", 0, 3)];
        let out = build(&matches);
        assert_eq!(out.data.root.as_ref().map(MatchId::as_str), Some("b"));
        assert_eq!(out.count(DiagnosticKind::AmbiguousBracket), 1);
        assert!(!out.data.valid);
    }

    #[test]
    fn test_ambiguous_explicit_roots() {
        let matches = vec![
            linked("q1", Some("s1")),
            linked("q2", Some("s1")),
            linked("s1", None),
            linked("x", None),
        ];
        let out = build(&matches);
        assert_eq!(out.data.root.as_ref().map(MatchId::as_str), Some("s1"));
        assert!(out.has(DiagnosticKind::AmbiguousBracket));
    }

    #[test]
    fn test_dangling_link_dropped() {
        let matches = vec![linked("a", Some("ghost")), linked("b", Some("a")), linked("c", Some("a"))];
        let out = build(&matches);
        assert!(out.has(DiagnosticKind::DanglingLink));
        assert_eq!(out.data.root.as_ref().map(MatchId::as_str), Some("a"));
        assert_eq!(out.data.get(&"a".into()).unwrap().next_match_id, None);
    }

    #[test]
    fn test_half_linked_match_flagged() {
        let matches = vec![linked("a", Some("f")), linked("f", None)];
        let out = build(&matches);
        let f = out.data.get(&"f".into()).unwrap();
        assert!(f.has_flag(MatchFlag::HalfLinked));
        assert!(out.has(DiagnosticKind::InvalidFeeders));
        assert!(!out.data.valid);
    }

    #[test]
    fn test_more_than_two_feeders_trimmed() {
        let matches = vec![
            linked("a", Some("f")),
            linked("b", Some("f")),
            linked("c", Some("f")),
            linked("f", None),
        ];
        let out = build(&matches);
        let f = out.data.get(&"f".into()).unwrap();
        assert_eq!(f.previous_match_ids, vec![MatchId::from("a"), MatchId::from("b")]);
        assert_eq!(out.data.get(&"c".into()).unwrap().next_match_id, None);
        assert!(out.has(DiagnosticKind::InvalidFeeders));
    }

    #[test]
    fn test_cycle_is_broken() {
        let matches = vec![linked("a", Some("b")), linked("b", Some("a"))];
        let out = build(&matches);
        let tree = &out.data;
        assert_eq!(tree.roots().len(), 1);
        assert!(tree.root.is_some());
        assert!(out.has(DiagnosticKind::AmbiguousBracket));
        assert!(!tree.valid);
    }

    #[test]
    fn test_self_link_is_dangling() {
        let out = build(&[linked("a", Some("a"))]);
        assert!(out.has(DiagnosticKind::DanglingLink));
        assert_eq!(out.data.root.as_ref().map(MatchId::as_str), Some("a"));
    }

    #[test]
    fn test_duplicates_dropped_first_wins() {
        let first = at("m1", 0, 0);
        let second = at("m1", 0, 5).with_best_of(Some(5));
        let out = build(&[first.clone(), second]);
        assert_eq!(out.data.len(), 1);
        assert_eq!(out.data.get(&"m1".into()).unwrap().best_of, None);
        assert_eq!(out.count(DiagnosticKind::DuplicateId), 1);
        assert!(out.data.valid);
    }

    #[test]
    fn test_unlinked_batch_is_forest() {
        let out = build(&[node("a"), node("b")]);
        assert_eq!(out.data.strategy, LinkageStrategy::Unlinked);
        assert_eq!(out.data.roots().len(), 2);
        assert_eq!(out.data.root.as_ref().map(MatchId::as_str), Some("a"));
    }

    fn positions_by_round(tree: &BracketTree) -> BTreeMap<u32, Vec<u32>> {
        let mut rounds: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for m in tree.matches.values() {
            rounds.entry(m.round).or_default().push(m.position);
        }
        for positions in rounds.values_mut() {
            positions.sort_unstable();
        }
        rounds
    }

    fn assert_positions_contiguous(tree: &BracketTree) {
        for (round, positions) in positions_by_round(tree) {
            let expected: Vec<u32> = (0..positions.len() as u32).collect();
            assert_eq!(positions, expected, "positions in round {}", round);
        }
    }

    #[test]
    fn test_deep_explicit_chain() {
        // c0 is the final; every c(k) is fed by c(k+1) and a leaf l(k).
        let depth = 40;
        let mut matches = vec![linked("c0", None)];
        for k in 0..depth {
            let parent = format!("c{}", k);
            matches.push(linked(&format!("c{}", k + 1), Some(&parent)));
            matches.push(linked(&format!("l{}", k), Some(&parent)));
        }

        let out = build(&matches);
        let tree = &out.data;
        assert!(tree.valid);
        assert_eq!(tree.root.as_ref().map(MatchId::as_str), Some("c0"));
        assert_eq!(tree.round_count(), depth + 1);
        assert_positions_contiguous(tree);
    }

    #[test]
    fn test_forest_positions_do_not_collide() {
        let matches = vec![
            linked("q1", Some("s1")),
            linked("q2", Some("s1")),
            linked("q3", Some("s2")),
            linked("q4", Some("s2")),
            linked("s1", Some("big")),
            linked("s2", Some("big")),
            linked("big", None),
            linked("x1", Some("small")),
            linked("x2", Some("small")),
            linked("small", None),
        ];
        let tree = build(&matches).data;
        assert_positions_contiguous(&tree);

        let small = tree.get(&"small".into()).unwrap();
        assert_eq!((small.round, small.position), (1, 2));
        let s2 = tree.get(&"s2".into()).unwrap();
        assert_eq!((s2.round, s2.position), (1, 1));
    }

    #[test]
    fn test_large_round_gap_reported_once() {
        let matches = vec![at("a", 0, 0), at("b", 0, 1), at("f", u32::MAX, 0)];
        let out = build(&matches);
        assert_eq!(out.count(DiagnosticKind::InconsistentRoundSizes), 1);
        assert_eq!(out.data.root.as_ref().map(MatchId::as_str), Some("f"));
        assert_eq!(out.data.get(&"a".into()).unwrap().next_match_id, None);
        assert!(!out.data.valid);
    }

    #[test]
    fn test_explicit_keeps_supplied_coordinates() {
        let matches = vec![
            at("q1", 1, 1).with_next(Some("f".into())),
            at("q2", 1, 2).with_next(Some("f".into())),
            at("f", 2, 1),
        ];
        let tree = build(&matches).data;
        assert_eq!(tree.get(&"f".into()).unwrap().round, 1);
        assert_eq!(tree.get(&"q2".into()).unwrap().position, 1);
    }
}
