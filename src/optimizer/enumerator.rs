//! Full-team combination search over per-player pattern lists.
//!
//! Depth-first cross product, one pattern per player, pruned as soon as the
//! running cost passes the budget. Completed rows are deduplicated by
//! [team_key]; only the best `row_limit` rows are kept as the search goes, and
//! the number of complete compositions visited is capped.

use std::collections::HashSet;

use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::assignment::{efficiency, flatten, team_key, Assignment, PlayerAssignments};
use crate::optimizer::pattern_tree::{team_pattern_tree, PlayerPattern};
use crate::optimizer::ranking::{rank_rows, RowOrder};
use crate::optimizer::SearchLimits;

/// One complete team composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRow {
    pub key: String,
    pub players: Vec<PlayerAssignments>,
    pub total_cost: u32,
    pub total_weight: u32,
    pub primary_count: usize,
    pub efficiency: f64,
}

impl TeamRow {
    pub fn from_players(players: Vec<PlayerAssignments>) -> Self {
        let total_cost = flatten(&players).map(|a| a.cost).sum();
        let total_weight = flatten(&players).map(|a| a.weight).sum();
        let primary_count = flatten(&players).filter(|a| a.is_primary()).count();
        Self {
            key: team_key(&players),
            total_cost,
            total_weight,
            primary_count,
            efficiency: efficiency(total_weight, total_cost),
            players,
        }
    }

    pub fn assignments_for(&self, player: &str) -> &[Assignment] {
        self.players
            .iter()
            .find(|entry| entry.player == player)
            .map(|entry| entry.assignments.as_slice())
            .unwrap_or(&[])
    }
}

/// The patterns one player may take, in preference order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOptions {
    pub player: String,
    pub patterns: Vec<PlayerPattern>,
}

/// Pattern lists for every player in roster order, taken from the pattern tree
/// (main pattern plus alternates). Players without a branch get an empty list.
pub fn team_options(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
    limits: &SearchLimits,
) -> Vec<PlayerOptions> {
    let tree = team_pattern_tree(players, catalog, budget, locks, limits);
    players
        .iter()
        .map(|player| PlayerOptions {
            player: player.name.clone(),
            patterns: tree
                .iter()
                .find(|branch| branch.player == player.name)
                .map(|branch| branch.options().cloned().collect())
                .unwrap_or_default(),
        })
        .collect()
}

fn pattern_allowed(player: &str, pattern: &PlayerPattern, locks: Option<&LockSet>) -> bool {
    let Some(locks) = locks else {
        return true;
    };
    if let Some(pinned) = locks.pin_of(player) {
        if !pattern.uses_unit(pinned) {
            return false;
        }
    }
    pattern
        .assignments
        .iter()
        .all(|a| !locks.is_pinned_to_other(&a.unit, player))
}

struct Search<'a> {
    options: Vec<(&'a str, Vec<&'a PlayerPattern>)>,
    budget: u32,
    order: RowOrder,
    limit: usize,
    max_leaves: usize,
    seen: HashSet<String>,
    /// Best rows so far; never more than twice `limit` between prunes.
    rows: Vec<TeamRow>,
    explored: usize,
}

impl<'a> Search<'a> {
    fn new(
        options: Vec<(&'a str, Vec<&'a PlayerPattern>)>,
        budget: u32,
        order: RowOrder,
        limits: &SearchLimits,
    ) -> Self {
        Self {
            options,
            budget,
            order,
            limit: limits.row_limit,
            max_leaves: limits.max_explored_leaves,
            seen: HashSet::new(),
            rows: Vec::new(),
            explored: 0,
        }
    }

    fn exhausted(&self) -> bool {
        self.explored >= self.max_leaves
    }

    fn descend(&mut self, depth: usize, spent: u32, chosen: &mut Vec<Option<&'a PlayerPattern>>) {
        if self.exhausted() {
            return;
        }
        if depth == self.options.len() {
            self.complete(spent, chosen);
            return;
        }

        let (_, patterns) = &self.options[depth];
        if patterns.is_empty() {
            chosen.push(None);
            self.descend(depth + 1, spent, chosen);
            chosen.pop();
            return;
        }

        // Collected up front so the borrow of `self.options` ends before recursing.
        let branch: Vec<&'a PlayerPattern> = patterns.clone();
        for pattern in branch {
            let next = spent + pattern.point_usage;
            if next > self.budget {
                continue;
            }
            chosen.push(Some(pattern));
            self.descend(depth + 1, next, chosen);
            chosen.pop();
        }
    }

    fn complete(&mut self, spent: u32, chosen: &[Option<&'a PlayerPattern>]) {
        self.explored += 1;
        if spent == 0 {
            return;
        }
        let players: Vec<PlayerAssignments> = self
            .options
            .iter()
            .zip(chosen)
            .map(|((player, _), pattern)| PlayerAssignments {
                player: (*player).to_string(),
                assignments: pattern.map_or_else(Vec::new, |p| p.assignments.clone()),
            })
            .collect();
        let row = TeamRow::from_players(players);
        if self.seen.insert(row.key.clone()) {
            self.rows.push(row);
            if self.rows.len() >= self.limit.saturating_mul(2).max(1) {
                self.prune();
            }
        }
    }

    /// Ranking is stable, so pruning early keeps the same top rows a full sort would.
    fn prune(&mut self) {
        rank_rows(&mut self.rows, self.order);
        self.rows.truncate(self.limit);
    }

    fn run(mut self) -> Self {
        let mut chosen = Vec::with_capacity(self.options.len());
        self.descend(0, 0, &mut chosen);
        self.prune();
        self
    }
}

/// Every distinct composition within `budget`, ranked by `order`, at most
/// `limits.row_limit` rows.
///
/// Patterns missing a player's pinned unit, or using a unit pinned to someone else,
/// are skipped. A player left with no patterns appears with an empty assignment list.
/// The search stops after `limits.max_explored_leaves` complete compositions and
/// ranks whatever it has found by then.
pub fn enumerate_team_rows(
    options: &[PlayerOptions],
    budget: u32,
    locks: Option<&LockSet>,
    order: RowOrder,
    limits: &SearchLimits,
) -> Vec<TeamRow> {
    let filtered: Vec<(&str, Vec<&PlayerPattern>)> = options
        .iter()
        .map(|entry| {
            let allowed = entry
                .patterns
                .iter()
                .filter(|pattern| pattern_allowed(&entry.player, pattern, locks))
                .collect();
            (entry.player.as_str(), allowed)
        })
        .collect();

    let search = Search::new(filtered, budget, order, limits).run();

    log::debug!(
        "enumerator: {} leaves explored, {} rows kept",
        search.explored,
        search.rows.len()
    );
    if search.exhausted() {
        log::warn!(
            "enumeration stopped after {} compositions; results cover a partial search",
            search.max_leaves
        );
    }
    if search.rows.is_empty() {
        log::warn!("no team composition fits within {budget} points");
    }

    search.rows
}

/// Pattern tree plus enumeration in one call.
pub fn team_patterns(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
    limits: &SearchLimits,
    order: RowOrder,
) -> Vec<TeamRow> {
    let options = team_options(players, catalog, budget, locks, limits);
    enumerate_team_rows(&options, budget, locks, order, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::Unit;
    use crate::optimizer::proficiency::ProficiencyTier;

    fn pattern(player: &str, units: &[(&str, u32, ProficiencyTier)]) -> PlayerPattern {
        let assignments = units
            .iter()
            .map(|(name, cost, tier)| Assignment::new(player, &Unit::new(*name, *cost), *tier))
            .collect();
        PlayerPattern::from_assignments(player, assignments)
    }

    fn options(player: &str, patterns: Vec<PlayerPattern>) -> PlayerOptions {
        PlayerOptions {
            player: player.to_string(),
            patterns,
        }
    }

    #[test]
    fn cross_product_respects_budget() {
        let input = vec![
            options(
                "ann",
                vec![
                    pattern("ann", &[("A1", 2, ProficiencyTier::Primary)]),
                    pattern("ann", &[("A2", 5, ProficiencyTier::Primary)]),
                ],
            ),
            options(
                "bo",
                vec![
                    pattern("bo", &[("B1", 3, ProficiencyTier::Secondary)]),
                    pattern("bo", &[("B2", 6, ProficiencyTier::Primary)]),
                ],
            ),
        ];
        let rows = enumerate_team_rows(&input, 8, None, RowOrder::Efficiency, &SearchLimits::default());
        // A1+B1 (5), A1+B2 (8), A2+B1 (8); A2+B2 is 11 and pruned.
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.total_cost <= 8));
        // A1+B1 weighs 7 for 5 points, the best ratio.
        assert_eq!(rows[0].key, "ann:A1|bo:B1");
    }

    #[test]
    fn identical_compositions_collapse_to_one_row() {
        let same = pattern("ann", &[("X", 1, ProficiencyTier::Usable), ("Y", 2, ProficiencyTier::Usable)]);
        let mut reordered = same.clone();
        reordered.assignments.reverse();
        let input = vec![options("ann", vec![same, reordered])];
        let rows = enumerate_team_rows(&input, 9, None, RowOrder::Efficiency, &SearchLimits::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "ann:X,Y");
    }

    #[test]
    fn empty_pattern_list_contributes_empty_assignment() {
        let input = vec![
            options("ann", vec![pattern("ann", &[("X", 2, ProficiencyTier::Primary)])]),
            options("bo", Vec::new()),
        ];
        let rows = enumerate_team_rows(&input, 9, None, RowOrder::Efficiency, &SearchLimits::default());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].assignments_for("bo").is_empty());
        assert_eq!(rows[0].key, "ann:X|bo:");
    }

    #[test]
    fn nothing_within_budget_is_empty() {
        let input = vec![options("ann", vec![pattern("ann", &[("X", 5, ProficiencyTier::Primary)])])];
        assert!(enumerate_team_rows(&input, 4, None, RowOrder::Efficiency, &SearchLimits::default()).is_empty());
        let nobody = vec![options("ann", Vec::new())];
        assert!(enumerate_team_rows(&nobody, 9, None, RowOrder::Efficiency, &SearchLimits::default()).is_empty());
    }

    #[test]
    fn locks_filter_patterns() {
        let input = vec![
            options(
                "ann",
                vec![
                    pattern("ann", &[("X", 1, ProficiencyTier::Primary)]),
                    pattern("ann", &[("Y", 1, ProficiencyTier::Primary)]),
                ],
            ),
            options(
                "bo",
                vec![
                    pattern("bo", &[("X", 1, ProficiencyTier::Primary)]),
                    pattern("bo", &[("Z", 1, ProficiencyTier::Usable)]),
                ],
            ),
        ];
        let locks: LockSet = [("ann", "X")].into_iter().collect();
        let rows = enumerate_team_rows(&input, 9, Some(&locks), RowOrder::Efficiency, &SearchLimits::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "ann:X|bo:Z");
    }

    #[test]
    fn truncates_to_limit() {
        let many: Vec<PlayerPattern> = (1..=6)
            .map(|i| pattern("ann", &[(format!("U{i}").as_str(), 1, ProficiencyTier::Usable)]))
            .collect();
        let input = vec![options("ann", many.clone()), options("bo", many)];
        let rows = enumerate_team_rows(&input, 9, None, RowOrder::Efficiency, &SearchLimits::default());
        assert_eq!(rows.len(), 20);
    }

    #[test]
    fn pruning_keeps_the_same_top_rows_as_a_full_ranking() {
        let many: Vec<PlayerPattern> = (1..=5)
            .map(|i| pattern("ann", &[(format!("U{i}").as_str(), i, ProficiencyTier::ALL[(i % 5) as usize])]))
            .collect();
        let others: Vec<PlayerPattern> = (1..=5)
            .map(|i| pattern("bo", &[(format!("V{i}").as_str(), 6 - i, ProficiencyTier::ALL[(i % 3) as usize])]))
            .collect();
        let input = vec![options("ann", many), options("bo", others)];
        let wide = SearchLimits {
            row_limit: 100,
            ..SearchLimits::default()
        };
        let narrow = SearchLimits {
            row_limit: 3,
            ..SearchLimits::default()
        };
        let full = enumerate_team_rows(&input, 20, None, RowOrder::Efficiency, &wide);
        let pruned = enumerate_team_rows(&input, 20, None, RowOrder::Efficiency, &narrow);
        assert_eq!(full.len(), 25);
        let expected: Vec<&str> = full.iter().take(3).map(|r| r.key.as_str()).collect();
        let actual: Vec<&str> = pruned.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn many_players_stop_at_the_leaf_cap() {
        let input: Vec<PlayerOptions> = (0..16)
            .map(|p| {
                let name = format!("p{p}");
                let patterns = (0..3)
                    .map(|u| pattern(&name, &[(format!("U{p}-{u}").as_str(), 1, ProficiencyTier::Usable)]))
                    .collect();
                options(&name, patterns)
            })
            .collect();
        let limits = SearchLimits {
            max_explored_leaves: 500,
            ..SearchLimits::default()
        };
        let filtered = input
            .iter()
            .map(|entry| (entry.player.as_str(), entry.patterns.iter().collect()))
            .collect();
        let search = Search::new(filtered, 500, RowOrder::Efficiency, &limits).run();
        assert_eq!(search.explored, 500);
        assert_eq!(search.rows.len(), limits.row_limit);

        let rows = enumerate_team_rows(&input, 500, None, RowOrder::Efficiency, &limits);
        assert_eq!(rows.len(), limits.row_limit);
        assert!(rows.iter().all(|r| r.total_cost == 16));
    }

    #[test]
    fn roster_level_search_finds_rows() {
        let catalog = Catalog::new(vec![Unit::new("X", 2), Unit::new("Y", 3), Unit::new("Z", 1)]);
        let players = vec![
            Player::new(1, "ann")
                .with_tier("X", ProficiencyTier::Primary)
                .with_tier("Z", ProficiencyTier::Usable),
            Player::new(2, "bo").with_tier("Y", ProficiencyTier::Primary),
        ];
        let limits = SearchLimits::default();
        let rows = team_patterns(&players, &catalog, 9, None, &limits, RowOrder::PrimaryFirst);
        assert!(!rows.is_empty());
        assert!(rows.len() <= limits.row_limit);
        assert_eq!(rows[0].primary_count, 2);
        assert!(rows.iter().all(|r| r.total_cost <= 9));
    }
}
