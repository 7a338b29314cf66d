//! Single-player optimizer: 0/1 knapsack over integer point buckets.
//!
//! `best[c]` holds the best weight reachable with cost at most `c`. Units are
//! visited in candidate order and buckets are filled from the budget downwards,
//! so each unit is taken at most once. A bucket only changes on a strict
//! improvement: among equal-weight subsets the first one found wins, which is
//! not necessarily the cheapest.

use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::assignment::{efficiency, total_cost, unit_set_key, Assignment};
use crate::optimizer::candidates::{candidate_units, efficiency_order};
use crate::optimizer::SearchLimits;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOptimization {
    pub player: String,
    pub assignments: Vec<Assignment>,
    pub total_cost: u32,
    pub total_weight: u32,
    pub efficiency: f64,
}

impl PlayerOptimization {
    fn from_selection(player: &str, assignments: Vec<Assignment>) -> Self {
        let total_cost = total_cost(&assignments);
        let total_weight = assignments.iter().map(|a| a.weight).sum();
        Self {
            player: player.to_string(),
            assignments,
            total_cost,
            total_weight,
            efficiency: efficiency(total_weight, total_cost),
        }
    }
}

/// Best-weight subset of `candidates` costing at most `budget`, in candidate order.
pub fn knapsack(candidates: &[Assignment], budget: u32) -> Vec<Assignment> {
    if candidates.is_empty() || budget == 0 {
        return Vec::new();
    }

    let capacity = budget as usize;
    let mut best = vec![0u32; capacity + 1];
    // taken[i][c]: candidate i improved bucket c when it was visited.
    let mut taken = vec![vec![false; capacity + 1]; candidates.len()];

    for (index, candidate) in candidates.iter().enumerate() {
        let cost = candidate.cost as usize;
        if cost > capacity {
            continue;
        }
        for bucket in (cost..=capacity).rev() {
            let with_unit = best[bucket - cost] + candidate.weight;
            if with_unit > best[bucket] {
                best[bucket] = with_unit;
                taken[index][bucket] = true;
            }
        }
    }

    let mut selected = Vec::new();
    let mut bucket = capacity;
    for index in (0..candidates.len()).rev() {
        if taken[index][bucket] {
            selected.push(candidates[index].clone());
            bucket -= candidates[index].cost as usize;
        }
    }
    selected.reverse();
    selected
}

pub fn optimize_player(
    player: &Player,
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
) -> PlayerOptimization {
    let candidates = candidate_units(player, catalog, locks);
    log::debug!(
        "knapsack for '{}': {} candidates, budget {}",
        player.name,
        candidates.len(),
        budget
    );
    PlayerOptimization::from_selection(&player.name, knapsack(&candidates, budget))
}

/// Every player optimised independently against the full budget, best total weight first.
pub fn optimize_all_players(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
) -> Vec<PlayerOptimization> {
    let mut results: Vec<PlayerOptimization> = players
        .iter()
        .map(|player| optimize_player(player, catalog, budget, locks))
        .collect();
    results.sort_by(|left, right| right.total_weight.cmp(&left.total_weight));
    results
}

/// Exact-DP selections for one player at every point level, most efficient first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointPattern {
    pub player: String,
    pub point_usage: u32,
    pub assignments: Vec<Assignment>,
    pub total_weight: u32,
    pub efficiency: f64,
}

/// For each player, the knapsack optimum at each level 1..=min(budget, sum of usable
/// costs), deduplicated by unit set; the best `limits.point_patterns_per_player` by
/// efficiency are kept. Locks are not applied here.
pub fn player_point_patterns(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    limits: &SearchLimits,
) -> Vec<PointPattern> {
    let mut patterns = Vec::new();

    for player in players {
        let mut candidates = candidate_units(player, catalog, None);
        candidates.sort_by(efficiency_order);
        let max_points = budget.min(candidates.iter().map(|c| c.cost).sum());

        let mut seen = std::collections::HashSet::new();
        let mut per_player = Vec::new();
        for points in 1..=max_points {
            let selection = knapsack(&candidates, points);
            if selection.is_empty() || !seen.insert(unit_set_key(&selection)) {
                continue;
            }
            let result = PlayerOptimization::from_selection(&player.name, selection);
            per_player.push(PointPattern {
                player: result.player,
                point_usage: result.total_cost,
                assignments: result.assignments,
                total_weight: result.total_weight,
                efficiency: result.efficiency,
            });
        }

        per_player.sort_by(|left, right| right.efficiency.total_cmp(&left.efficiency));
        per_player.truncate(limits.point_patterns_per_player);
        patterns.extend(per_player);
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::Unit;
    use crate::optimizer::proficiency::ProficiencyTier;

    fn catalog() -> Catalog {
        Catalog::new(vec![Unit::new("X", 3), Unit::new("Y", 4)])
    }

    fn player() -> Player {
        Player::new(1, "ann")
            .with_tier("X", ProficiencyTier::Primary)
            .with_tier("Y", ProficiencyTier::Secondary)
    }

    fn unit_names(result: &PlayerOptimization) -> Vec<&str> {
        result.assignments.iter().map(|a| a.unit.as_str()).collect()
    }

    #[test]
    fn budget_four_prefers_higher_weight_unit() {
        let result = optimize_player(&player(), &catalog(), 4, None);
        assert_eq!(unit_names(&result), vec!["X"]);
        assert_eq!(result.total_cost, 3);
        assert_eq!(result.total_weight, 4);
    }

    #[test]
    fn budget_seven_takes_both_units() {
        let result = optimize_player(&player(), &catalog(), 7, None);
        assert_eq!(unit_names(&result), vec!["X", "Y"]);
        assert_eq!(result.total_cost, 7);
        assert_eq!(result.total_weight, 7);
        assert!((result.efficiency - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_budget_or_no_candidates_is_empty() {
        let result = optimize_player(&player(), &catalog(), 0, None);
        assert!(result.assignments.is_empty());
        assert_eq!((result.total_cost, result.total_weight), (0, 0));
        assert_eq!(result.efficiency, 0.0);

        let nobody = Player::new(2, "bo");
        let result = optimize_player(&nobody, &catalog(), 9, None);
        assert!(result.assignments.is_empty());
    }

    #[test]
    fn first_found_subset_wins_weight_ties() {
        // P (cost 2, w2) is visited first; Q (cost 1, w2) ties it at bucket 2 and does not replace it.
        let catalog = Catalog::new(vec![Unit::new("P", 2), Unit::new("Q", 1)]);
        let player = Player::new(1, "ann")
            .with_tier("P", ProficiencyTier::Usable)
            .with_tier("Q", ProficiencyTier::Usable);
        let candidates = vec![
            Assignment::new("ann", &catalog.units()[0], ProficiencyTier::Usable),
            Assignment::new("ann", &catalog.units()[1], ProficiencyTier::Usable),
        ];
        let selection = knapsack(&candidates, 2);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].unit, "P");

        // Through the candidate filter the cheaper unit is ordered first instead.
        let result = optimize_player(&player, &catalog, 2, None);
        assert_eq!(unit_names(&result), vec!["Q"]);
    }

    #[test]
    fn all_players_sorted_by_weight() {
        let players = vec![
            Player::new(2, "bo").with_tier("Y", ProficiencyTier::Unconfident),
            player(),
        ];
        let results = optimize_all_players(&players, &catalog(), 7, None);
        assert_eq!(results[0].player, "ann");
        assert_eq!(results[0].total_weight, 7);
        assert_eq!(results[1].player, "bo");
        assert_eq!(results[1].total_weight, 1);
    }

    #[test]
    fn point_patterns_are_unique_and_capped() {
        let catalog = Catalog::new(vec![Unit::new("X", 1), Unit::new("Y", 2), Unit::new("Z", 3)]);
        let player = Player::new(1, "ann")
            .with_tier("X", ProficiencyTier::Primary)
            .with_tier("Y", ProficiencyTier::Primary)
            .with_tier("Z", ProficiencyTier::Usable);
        let patterns = player_point_patterns(&[player], &catalog, 9, &SearchLimits::default());
        assert_eq!(patterns.len(), 3);
        let keys: std::collections::HashSet<String> =
            patterns.iter().map(|p| unit_set_key(&p.assignments)).collect();
        assert_eq!(keys.len(), patterns.len());
        assert!(patterns.windows(2).all(|w| w[0].efficiency >= w[1].efficiency));
        assert_eq!(patterns[0].assignments[0].unit, "X");
    }
}
