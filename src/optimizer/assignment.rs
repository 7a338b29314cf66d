//! Result value types shared by every optimizer: one unit bound to one player, and
//! the per-player / whole-team aggregates derived from lists of them.

use serde::Serialize;

use crate::data::catalog::Unit;
use crate::optimizer::proficiency::ProficiencyTier;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Assignment {
    pub player: String,
    pub unit: String,
    pub tier: ProficiencyTier,
    pub weight: u32,
    pub cost: u32,
}

impl Assignment {
    pub fn new(player: &str, unit: &Unit, tier: ProficiencyTier) -> Self {
        Self {
            player: player.to_string(),
            unit: unit.name.clone(),
            tier,
            weight: tier.weight(),
            cost: unit.cost,
        }
    }

    /// Weight per point; cost is at least 1 for catalog units.
    pub fn unit_efficiency(&self) -> f64 {
        efficiency(self.weight, self.cost)
    }

    pub fn is_primary(&self) -> bool {
        self.tier == ProficiencyTier::Primary
    }
}

/// Weight divided by cost, 0 when nothing is spent.
pub fn efficiency(weight: u32, cost: u32) -> f64 {
    if cost == 0 {
        0.0
    } else {
        f64::from(weight) / f64::from(cost)
    }
}

pub fn total_cost(assignments: &[Assignment]) -> u32 {
    assignments.iter().map(|a| a.cost).sum()
}

pub fn total_weight(assignments: &[Assignment]) -> u32 {
    assignments.iter().map(|a| a.weight).sum()
}

pub fn primary_count(assignments: &[Assignment]) -> usize {
    assignments.iter().filter(|a| a.is_primary()).count()
}

/// Sorted, comma-joined unit names; identical unit sets give identical keys.
pub fn unit_set_key(assignments: &[Assignment]) -> String {
    let mut names: Vec<&str> = assignments.iter().map(|a| a.unit.as_str()).collect();
    names.sort_unstable();
    names.join(",")
}

/// The units one player receives in a team-level result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAssignments {
    pub player: String,
    pub assignments: Vec<Assignment>,
}

impl PlayerAssignments {
    pub fn empty(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            assignments: Vec::new(),
        }
    }

    pub fn total_cost(&self) -> u32 {
        total_cost(&self.assignments)
    }

    pub fn total_weight(&self) -> u32 {
        total_weight(&self.assignments)
    }
}

/// Every assignment across a team, in player order.
pub fn flatten(players: &[PlayerAssignments]) -> impl Iterator<Item = &Assignment> {
    players.iter().flat_map(|p| p.assignments.iter())
}

/// `player:unitA,unitB|player2:...` over players sorted by name. Identifies a team
/// composition regardless of the order it was built in.
pub fn team_key(players: &[PlayerAssignments]) -> String {
    let mut parts: Vec<(&str, String)> = players
        .iter()
        .map(|p| (p.player.as_str(), unit_set_key(&p.assignments)))
        .collect();
    parts.sort_by(|a, b| a.0.cmp(b.0));
    parts
        .iter()
        .map(|(player, units)| format!("{player}:{units}"))
        .collect::<Vec<_>>()
        .join("|")
}
