use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::optimizer::enumerator::TeamRow;
use crate::optimizer::pattern_tree::PlayerPattern;

/// How enumerated team rows are ordered before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Efficiency (to the hundredth) descending, then total cost descending.
    #[default]
    Efficiency,
    /// Primary-tier unit count descending, then efficiency descending.
    PrimaryFirst,
    /// Total weight descending, then efficiency descending.
    TotalWeight,
}

/// Efficiencies closer than a hundredth rank as equal. Bucketing keeps the
/// comparison a total order, which `sort_by` requires.
fn efficiency_bucket(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub fn compare_rows(left: &TeamRow, right: &TeamRow, order: RowOrder) -> Ordering {
    match order {
        RowOrder::Efficiency => efficiency_bucket(right.efficiency)
            .cmp(&efficiency_bucket(left.efficiency))
            .then_with(|| right.total_cost.cmp(&left.total_cost)),
        RowOrder::PrimaryFirst => right
            .primary_count
            .cmp(&left.primary_count)
            .then_with(|| right.efficiency.total_cmp(&left.efficiency)),
        RowOrder::TotalWeight => right
            .total_weight
            .cmp(&left.total_weight)
            .then_with(|| right.efficiency.total_cmp(&left.efficiency)),
    }
}

/// Stable: rows that compare equal keep discovery order.
pub fn rank_rows(rows: &mut [TeamRow], order: RowOrder) {
    rows.sort_by(|left, right| compare_rows(left, right, order));
}

/// Primary-unit count descending, then efficiency descending.
pub fn rank_player_patterns(patterns: &mut [PlayerPattern]) {
    patterns.sort_by(|left, right| {
        right
            .primary_count
            .cmp(&left.primary_count)
            .then_with(|| right.efficiency.total_cmp(&left.efficiency))
    });
}
