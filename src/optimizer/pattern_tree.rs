//! Per-player point-usage patterns, the input of the team enumerator.
//!
//! Each player is packed greedily (candidate order, Primary first) against every
//! point target up to the pattern cap. The resulting selections are ranked and
//! split into one main pattern plus a few alternates.

use std::collections::HashSet;

use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::assignment::{efficiency, primary_count, total_cost, total_weight, unit_set_key, Assignment};
use crate::optimizer::candidates::candidate_units;
use crate::optimizer::ranking::rank_player_patterns;
use crate::optimizer::SearchLimits;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPattern {
    pub player: String,
    pub point_usage: u32,
    pub assignments: Vec<Assignment>,
    pub primary_count: usize,
    pub efficiency: f64,
}

impl PlayerPattern {
    pub fn from_assignments(player: &str, assignments: Vec<Assignment>) -> Self {
        let point_usage = total_cost(&assignments);
        Self {
            player: player.to_string(),
            point_usage,
            primary_count: primary_count(&assignments),
            efficiency: efficiency(total_weight(&assignments), point_usage),
            assignments,
        }
    }

    pub fn total_weight(&self) -> u32 {
        total_weight(&self.assignments)
    }

    pub fn uses_unit(&self, unit: &str) -> bool {
        self.assignments.iter().any(|a| a.unit == unit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternBranch {
    pub player: String,
    pub main: PlayerPattern,
    pub alternatives: Vec<PlayerPattern>,
}

impl PatternBranch {
    /// Main pattern followed by its alternates.
    pub fn options(&self) -> impl Iterator<Item = &PlayerPattern> {
        std::iter::once(&self.main).chain(self.alternatives.iter())
    }
}

/// Walks `candidates` in order, taking each unit that still fits under `target`;
/// stops once the target is hit exactly.
pub fn greedy_pack(candidates: &[Assignment], target: u32) -> Vec<Assignment> {
    let mut selected = Vec::new();
    let mut spent = 0u32;
    for candidate in candidates {
        if spent + candidate.cost > target {
            continue;
        }
        spent += candidate.cost;
        selected.push(candidate.clone());
        if spent == target {
            break;
        }
    }
    selected
}

/// Every distinct greedy selection for `player` at point targets
/// 1..=min(budget, cap), ranked by Primary count then efficiency.
pub fn player_patterns(
    player: &Player,
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
    limits: &SearchLimits,
) -> Vec<PlayerPattern> {
    let candidates = candidate_units(player, catalog, locks);
    let mut seen = HashSet::new();
    let mut patterns = Vec::new();

    for target in 1..=budget.min(limits.pattern_point_cap) {
        let selection = greedy_pack(&candidates, target);
        if selection.is_empty() || !seen.insert(unit_set_key(&selection)) {
            continue;
        }
        patterns.push(PlayerPattern::from_assignments(&player.name, selection));
    }

    rank_player_patterns(&mut patterns);
    patterns
}

/// One branch per player who has at least one pattern. Alternates must differ
/// from the main pattern in point usage or Primary count.
pub fn team_pattern_tree(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
    limits: &SearchLimits,
) -> Vec<PatternBranch> {
    let mut branches = Vec::new();

    for player in players {
        let mut ranked = player_patterns(player, catalog, budget, locks, limits).into_iter();
        let Some(main) = ranked.next() else {
            log::debug!("no patterns for '{}' within {budget} points", player.name);
            continue;
        };
        let alternatives = ranked
            .filter(|pattern| {
                pattern.point_usage != main.point_usage || pattern.primary_count != main.primary_count
            })
            .take(limits.alternatives_per_player)
            .collect();
        branches.push(PatternBranch {
            player: player.name.clone(),
            main,
            alternatives,
        });
    }

    branches
}
