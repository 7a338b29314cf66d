pub mod assignment;
pub mod balanced;
pub mod candidates;
pub mod enumerator;
pub mod knapsack;
pub mod pattern_tree;
pub mod priority;
pub mod proficiency;
pub mod ranking;
pub mod team;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::balanced::balanced_team_rows;
use crate::optimizer::enumerator::{team_patterns, TeamRow};
use crate::optimizer::priority::{priority_patterns, PriorityPattern};
use crate::optimizer::proficiency::ProficiencyTier;
use crate::optimizer::ranking::RowOrder;
use crate::optimizer::team::{optimize_team, TeamAllocation};

/// Bounds on every search that could otherwise grow combinatorially.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLimits {
    /// Highest point target tried when building per-player patterns.
    pub pattern_point_cap: u32,
    pub alternatives_per_player: usize,
    /// Rows kept after ranking an enumeration.
    pub row_limit: usize,
    /// Complete compositions the enumerator visits before it stops searching.
    pub max_explored_leaves: usize,
    pub point_patterns_per_player: usize,
    pub balanced_attempts: usize,
    pub balanced_row_cap: usize,
    /// How many of a player's best remaining units a balanced draw picks from.
    pub balanced_top_choices: usize,
    pub balanced_min_tier: ProficiencyTier,
    pub priority_choice_cap: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            pattern_point_cap: 6,
            alternatives_per_player: 2,
            row_limit: 20,
            max_explored_leaves: 20_000,
            point_patterns_per_player: 3,
            balanced_attempts: 300,
            balanced_row_cap: 50,
            balanced_top_choices: 3,
            balanced_min_tier: ProficiencyTier::Usable,
            priority_choice_cap: 30,
        }
    }
}

/// What a scenario optimises for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    /// One greedy allocation under the shared budget.
    #[default]
    Team,
    /// Enumerated rows, most efficient first.
    Patterns,
    /// Enumerated rows, most Primary-tier units first.
    PrimaryFirst,
    /// Randomised one-unit-per-player rows.
    Balanced,
    /// One player's choice fixed first.
    Priority,
}

#[derive(Debug, Clone)]
pub struct OptimizationScenario<'a> {
    pub players: &'a [Player],
    pub catalog: &'a Catalog,
    pub budget: u32,
    pub locks: Option<&'a LockSet>,
    pub objective: Objective,
    /// Seeds the balanced search. When None the generator is seeded from entropy.
    pub seed: Option<u64>,
    /// Required by [Objective::Priority]; ignored otherwise.
    pub priority_player: Option<&'a str>,
    pub priority_units: &'a [String],
    pub limits: SearchLimits,
}

impl<'a> OptimizationScenario<'a> {
    pub fn new(players: &'a [Player], catalog: &'a Catalog, budget: u32) -> Self {
        Self {
            players,
            catalog,
            budget,
            locks: None,
            objective: Objective::default(),
            seed: None,
            priority_player: None,
            priority_units: &[],
            limits: SearchLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Team(TeamAllocation),
    Rows(Vec<TeamRow>),
    Priority(Vec<PriorityPattern>),
}

pub fn scenario_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

pub fn optimize_scenario(scenario: &OptimizationScenario<'_>) -> ScenarioOutcome {
    let OptimizationScenario {
        players,
        catalog,
        budget,
        locks,
        ..
    } = *scenario;
    let limits = &scenario.limits;

    match scenario.objective {
        Objective::Team => ScenarioOutcome::Team(optimize_team(players, catalog, budget, locks)),
        Objective::Patterns => ScenarioOutcome::Rows(team_patterns(
            players,
            catalog,
            budget,
            locks,
            limits,
            RowOrder::Efficiency,
        )),
        Objective::PrimaryFirst => ScenarioOutcome::Rows(team_patterns(
            players,
            catalog,
            budget,
            locks,
            limits,
            RowOrder::PrimaryFirst,
        )),
        Objective::Balanced => {
            let mut rng = scenario_rng(scenario.seed);
            ScenarioOutcome::Rows(balanced_team_rows(
                players, catalog, budget, locks, limits, &mut rng,
            ))
        }
        Objective::Priority => {
            let Some(player) = scenario.priority_player else {
                log::warn!("priority objective without a priority player");
                return ScenarioOutcome::Priority(Vec::new());
            };
            ScenarioOutcome::Priority(priority_patterns(
                players,
                catalog,
                budget,
                locks,
                player,
                scenario.priority_units,
                limits,
            ))
        }
    }
}
