//! Whole-team allocation under one shared budget.
//!
//! Single greedy pass over every (player, unit) pair ordered by weight per point.
//! This approximates the generalized assignment problem; it is not exact.

use std::collections::HashSet;

use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::assignment::{efficiency, Assignment, PlayerAssignments};
use crate::optimizer::candidates::candidate_units;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAllocation {
    /// One entry per input player, in input order; players who got nothing have an empty list.
    pub players: Vec<PlayerAssignments>,
    pub total_cost: u32,
    pub total_weight: u32,
    pub efficiency: f64,
}

impl TeamAllocation {
    pub fn assignments_for(&self, player: &str) -> &[Assignment] {
        self.players
            .iter()
            .find(|entry| entry.player == player)
            .map(|entry| entry.assignments.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.players.iter().all(|entry| entry.assignments.is_empty())
    }
}

pub fn optimize_team(
    players: &[Player],
    catalog: &Catalog,
    budget: u32,
    locks: Option<&LockSet>,
) -> TeamAllocation {
    let mut entries: Vec<PlayerAssignments> = players
        .iter()
        .map(|player| PlayerAssignments::empty(player.name.as_str()))
        .collect();

    // (player index, candidate); the stable sort keeps player order for equal ratios.
    let mut pool: Vec<(usize, Assignment)> = players
        .iter()
        .enumerate()
        .flat_map(|(index, player)| {
            candidate_units(player, catalog, locks)
                .into_iter()
                .map(move |candidate| (index, candidate))
        })
        .collect();
    pool.sort_by(|(_, left), (_, right)| {
        right.unit_efficiency().total_cmp(&left.unit_efficiency())
    });
    log::debug!("team greedy: {} candidate pairs, budget {budget}", pool.len());

    let mut used_units: HashSet<String> = HashSet::new();
    let mut total_cost = 0u32;
    let mut total_weight = 0u32;

    for (index, candidate) in pool {
        if used_units.contains(&candidate.unit) || total_cost + candidate.cost > budget {
            continue;
        }
        total_cost += candidate.cost;
        total_weight += candidate.weight;
        used_units.insert(candidate.unit.clone());
        entries[index].assignments.push(candidate);
    }

    if total_cost == 0 {
        log::warn!("no team composition fits within {budget} points");
    }

    TeamAllocation {
        players: entries,
        total_cost,
        total_weight,
        efficiency: efficiency(total_weight, total_cost),
    }
}
