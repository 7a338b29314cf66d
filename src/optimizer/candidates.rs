use std::cmp::Ordering;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::assignment::Assignment;
use crate::optimizer::proficiency::tier_of;

/// Units `player` may pilot under `locks`, best first.
///
/// Unusable units are dropped. A pinned player keeps only the pinned unit (nothing if
/// the pin names a unit the catalog lacks or the player cannot use); everyone else
/// loses units pinned to other players. Ordering is weight descending, then cost
/// ascending, then catalog order; greedy callers rely on it for tie-breaks.
pub fn candidate_units(player: &Player, catalog: &Catalog, locks: Option<&LockSet>) -> Vec<Assignment> {
    let own_pin = locks.and_then(|locks| locks.pin_of(&player.name));

    let mut candidates: Vec<Assignment> = catalog
        .iter()
        .filter_map(|unit| {
            let tier = tier_of(player, &unit.name);
            if !tier.is_usable() {
                return None;
            }
            if let Some(pinned) = own_pin {
                if unit.name != pinned {
                    return None;
                }
            } else if locks.is_some_and(|locks| locks.is_pinned_to_other(&unit.name, &player.name)) {
                return None;
            }
            Some(Assignment::new(&player.name, unit, tier))
        })
        .collect();

    candidates.sort_by(candidate_order);
    candidates
}

/// Weight descending, cost ascending. Stable sorts keep catalog order for full ties.
pub fn candidate_order(left: &Assignment, right: &Assignment) -> Ordering {
    right
        .weight
        .cmp(&left.weight)
        .then_with(|| left.cost.cmp(&right.cost))
}

/// Weight-per-point descending, then [candidate_order].
pub fn efficiency_order(left: &Assignment, right: &Assignment) -> Ordering {
    right
        .unit_efficiency()
        .total_cmp(&left.unit_efficiency())
        .then_with(|| candidate_order(left, right))
}
