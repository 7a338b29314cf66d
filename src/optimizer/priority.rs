//! Priority-player variant: settle one player's choice first, then fill the rest.

use std::collections::HashSet;

use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::assignment::{efficiency, flatten, total_cost, Assignment, PlayerAssignments};
use crate::optimizer::candidates::{candidate_units, efficiency_order};
use crate::optimizer::knapsack::{optimize_all_players, PlayerOptimization};
use crate::optimizer::proficiency::tier_of;
use crate::optimizer::SearchLimits;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityPattern {
    pub priority_player: String,
    pub priority_choice: Vec<Assignment>,
    /// What every other player flies alongside the choice, in roster order.
    pub alternatives: Vec<PlayerAssignments>,
    pub total_cost: u32,
    pub total_weight: u32,
    pub efficiency: f64,
}

impl PriorityPattern {
    fn new(
        priority_player: &str,
        priority_choice: Vec<Assignment>,
        alternatives: Vec<PlayerAssignments>,
    ) -> Self {
        let total_cost = total_cost(&priority_choice)
            + alternatives.iter().map(PlayerAssignments::total_cost).sum::<u32>();
        let total_weight = priority_choice.iter().map(|a| a.weight).sum::<u32>()
            + flatten(&alternatives).map(|a| a.weight).sum::<u32>();
        Self {
            priority_player: priority_player.to_string(),
            priority_choice,
            alternatives,
            total_cost,
            total_weight,
            efficiency: efficiency(total_weight, total_cost),
        }
    }
}

/// Each other player, in roster order, takes its most efficient unused unit that
/// still fits in what is left of the budget.
fn fill_others(
    players: &[Player],
    priority: &Player,
    catalog: &Catalog,
    mut remaining: u32,
    used: &mut HashSet<String>,
    locks: Option<&LockSet>,
) -> Vec<PlayerAssignments> {
    players
        .iter()
        .filter(|player| player.id != priority.id)
        .map(|player| {
            let mut candidates = candidate_units(player, catalog, locks);
            candidates.sort_by(efficiency_order);
            let mut entry = PlayerAssignments::empty(player.name.as_str());
            if let Some(pick) = candidates
                .into_iter()
                .find(|c| !used.contains(&c.unit) && c.cost <= remaining)
            {
                remaining -= pick.cost;
                used.insert(pick.unit.clone());
                entry.assignments.push(pick);
            }
            entry
        })
        .collect()
}

/// The explicitly requested units for the priority player, each at most once and in
/// request order. Names missing from the catalog and units pinned to another player
/// are dropped. A pinned priority player must have the pinned unit among them.
fn explicit_choice(
    priority: &Player,
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
    names: &[String],
) -> Option<Vec<Assignment>> {
    let mut requested = HashSet::new();
    let mut chosen = Vec::new();
    for name in names {
        if !requested.insert(name.as_str()) {
            continue;
        }
        let Some(unit) = catalog.get(name) else {
            continue;
        };
        if locks.is_some_and(|locks| locks.is_pinned_to_other(&unit.name, &priority.name)) {
            log::warn!("unit '{}' is pinned to another player; dropped from the priority choice", unit.name);
            continue;
        }
        chosen.push(Assignment::new(&priority.name, unit, tier_of(priority, &unit.name)));
    }

    if let Some(pinned) = locks.and_then(|locks| locks.pin_of(&priority.name)) {
        if !chosen.iter().any(|a| a.unit == pinned) {
            log::warn!("'{}' is pinned to '{pinned}', which the priority choice leaves out", priority.name);
            return None;
        }
    }
    (!chosen.is_empty() && total_cost(&chosen) <= budget).then_some(chosen)
}

/// Patterns with `priority_player` served first.
///
/// With `explicit_units` the player is given exactly those units (see
/// [explicit_choice]) and a single pattern comes back, or none when they overrun
/// the budget. Otherwise one pattern is built per affordable candidate unit of the
/// player, best candidate first, at most `limits.priority_choice_cap` of them. An
/// unknown player yields nothing.
pub fn priority_patterns(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
    priority_player: &str,
    explicit_units: &[String],
    limits: &SearchLimits,
) -> Vec<PriorityPattern> {
    let Some(priority) = players.iter().find(|p| p.name == priority_player) else {
        log::warn!("priority player '{priority_player}' is not on the roster");
        return Vec::new();
    };

    let choices: Vec<Vec<Assignment>> = if explicit_units.is_empty() {
        candidate_units(priority, catalog, locks)
            .into_iter()
            .filter(|c| c.cost <= budget)
            .take(limits.priority_choice_cap)
            .map(|c| vec![c])
            .collect()
    } else {
        explicit_choice(priority, catalog, budget, locks, explicit_units)
            .into_iter()
            .collect()
    };

    log::debug!(
        "priority for '{}': {} choices within {budget} points",
        priority.name,
        choices.len()
    );

    choices
        .into_iter()
        .map(|choice| {
            let mut used: HashSet<String> = choice.iter().map(|a| a.unit.clone()).collect();
            let remaining = budget - total_cost(&choice);
            let others = fill_others(players, priority, catalog, remaining, &mut used, locks);
            PriorityPattern::new(&priority.name, choice, others)
        })
        .collect()
}

/// Per-player optimums next to each player's best priority pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationOverview {
    pub standard: Vec<PlayerOptimization>,
    pub priority: Vec<PriorityPattern>,
}

/// The priority entry for a player is its highest-weight pattern (earliest on ties);
/// players with no pattern are left out.
pub fn optimization_overview(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
    limits: &SearchLimits,
) -> OptimizationOverview {
    let standard = optimize_all_players(players, catalog, budget, locks);
    let priority = players
        .iter()
        .filter_map(|player| {
            priority_patterns(players, catalog, budget, locks, &player.name, &[], limits)
                .into_iter()
                .reduce(|best, next| if next.total_weight > best.total_weight { next } else { best })
        })
        .collect();
    OptimizationOverview { standard, priority }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::Unit;
    use crate::optimizer::proficiency::ProficiencyTier;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Unit::new("A", 3),
            Unit::new("B", 2),
            Unit::new("C", 1),
            Unit::new("D", 4),
        ])
    }

    fn players() -> Vec<Player> {
        vec![
            Player::new(1, "ann")
                .with_tier("A", ProficiencyTier::Primary)
                .with_tier("B", ProficiencyTier::Secondary)
                .with_tier("D", ProficiencyTier::Primary),
            Player::new(2, "bo")
                .with_tier("A", ProficiencyTier::Primary)
                .with_tier("C", ProficiencyTier::Usable),
            Player::new(3, "cy").with_tier("B", ProficiencyTier::Primary),
        ]
    }

    fn choice_units(pattern: &PriorityPattern) -> Vec<&str> {
        pattern.priority_choice.iter().map(|a| a.unit.as_str()).collect()
    }

    #[test]
    fn one_pattern_per_affordable_candidate() {
        let patterns = priority_patterns(&players(), &catalog(), 6, None, "ann", &[], &SearchLimits::default());
        // Candidate order for ann: A (4, cost 3), D (4, cost 4), B (3, cost 2)
        let firsts: Vec<Vec<&str>> = patterns.iter().map(choice_units).collect();
        assert_eq!(firsts, vec![vec!["A"], vec!["D"], vec!["B"]]);
        assert!(patterns.iter().all(|p| p.total_cost <= 6));
    }

    #[test]
    fn others_fill_from_remaining_budget_without_reusing_units() {
        let patterns = priority_patterns(&players(), &catalog(), 6, None, "ann", &[], &SearchLimits::default());
        let first = &patterns[0];
        // ann takes A (3): bo's A is gone so bo takes C (1), cy takes B (2).
        assert_eq!(first.alternatives.len(), 2);
        assert_eq!(first.alternatives[0].player, "bo");
        assert_eq!(first.alternatives[0].assignments[0].unit, "C");
        assert_eq!(first.alternatives[1].assignments[0].unit, "B");
        assert_eq!(first.total_cost, 6);
        assert_eq!(first.total_weight, 4 + 2 + 4);

        // ann takes B: cy loses its only unit.
        let third = &patterns[2];
        assert!(third.alternatives[1].assignments.is_empty());
    }

    #[test]
    fn explicit_units_give_a_single_pattern() {
        let units = vec!["B".to_string(), "Nope".to_string(), "C".to_string()];
        let patterns = priority_patterns(&players(), &catalog(), 6, None, "ann", &units, &SearchLimits::default());
        assert_eq!(patterns.len(), 1);
        assert_eq!(choice_units(&patterns[0]), vec!["B", "C"]);
        // C is unusable for ann but was asked for explicitly.
        assert_eq!(patterns[0].priority_choice[1].weight, 0);

        let over = vec!["A".to_string(), "D".to_string()];
        assert!(priority_patterns(&players(), &catalog(), 6, None, "ann", &over, &SearchLimits::default()).is_empty());
    }

    #[test]
    fn explicit_units_are_deduplicated_and_respect_pins() {
        let limits = SearchLimits::default();
        let twice = vec!["A".to_string(), "A".to_string()];
        let patterns = priority_patterns(&players(), &catalog(), 6, None, "ann", &twice, &limits);
        assert_eq!(choice_units(&patterns[0]), vec!["A"]);
        assert_eq!(
            patterns[0].priority_choice.iter().map(|a| a.cost).sum::<u32>(),
            3
        );

        // A belongs to bo, so ann only gets B and bo keeps A.
        let locks: LockSet = [("bo", "A")].into_iter().collect();
        let units = vec!["A".to_string(), "B".to_string()];
        let patterns = priority_patterns(&players(), &catalog(), 9, Some(&locks), "ann", &units, &limits);
        assert_eq!(choice_units(&patterns[0]), vec!["B"]);
        assert_eq!(patterns[0].alternatives[0].assignments[0].unit, "A");

        let only_pinned = vec!["A".to_string()];
        assert!(priority_patterns(&players(), &catalog(), 9, Some(&locks), "ann", &only_pinned, &limits).is_empty());

        // ann pinned to D must keep D.
        let locks: LockSet = [("ann", "D")].into_iter().collect();
        let without_pin = vec!["B".to_string()];
        assert!(priority_patterns(&players(), &catalog(), 9, Some(&locks), "ann", &without_pin, &limits).is_empty());
        let with_pin = vec!["D".to_string(), "B".to_string()];
        let patterns = priority_patterns(&players(), &catalog(), 9, Some(&locks), "ann", &with_pin, &limits);
        assert_eq!(choice_units(&patterns[0]), vec!["D", "B"]);
    }

    #[test]
    fn unknown_player_or_zero_budget_is_empty() {
        let limits = SearchLimits::default();
        assert!(priority_patterns(&players(), &catalog(), 6, None, "zed", &[], &limits).is_empty());
        assert!(priority_patterns(&players(), &catalog(), 0, None, "ann", &[], &limits).is_empty());
    }

    #[test]
    fn choice_cap_bounds_patterns() {
        let limits = SearchLimits {
            priority_choice_cap: 1,
            ..SearchLimits::default()
        };
        let patterns = priority_patterns(&players(), &catalog(), 9, None, "ann", &[], &limits);
        assert_eq!(patterns.len(), 1);
    }

    #[test]
    fn overview_lists_standard_and_best_priority_per_player() {
        let overview = optimization_overview(&players(), &catalog(), 6, None, &SearchLimits::default());
        assert_eq!(overview.standard.len(), 3);
        assert_eq!(overview.priority.len(), 3);
        assert_eq!(overview.priority[0].priority_player, "ann");
        assert_eq!(overview.priority[0].total_weight, 10);
    }
}
