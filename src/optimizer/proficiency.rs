//! Proficiency tiers and their numeric weights.
//!
//! A player rates every unit with one of five tiers. Missing ratings resolve to
//! [ProficiencyTier::Unusable], so lookups are total.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::roster::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyTier {
    Primary,
    Secondary,
    Usable,
    Unconfident,
    #[default]
    Unusable,
}

impl ProficiencyTier {
    /// Highest to lowest.
    pub const ALL: [ProficiencyTier; 5] = [
        Self::Primary,
        Self::Secondary,
        Self::Usable,
        Self::Unconfident,
        Self::Unusable,
    ];

    pub fn weight(self) -> u32 {
        match self {
            Self::Primary => 4,
            Self::Secondary => 3,
            Self::Usable => 2,
            Self::Unconfident => 1,
            Self::Unusable => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Usable => "usable",
            Self::Unconfident => "unconfident",
            Self::Unusable => "unusable",
        }
    }

    pub fn is_usable(self) -> bool {
        self.weight() > 0
    }
}

impl Ord for ProficiencyTier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl PartialOrd for ProficiencyTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProficiencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn tier_of(player: &Player, unit: &str) -> ProficiencyTier {
    player.proficiency.get(unit).copied().unwrap_or_default()
}

pub fn weight_of(tier: ProficiencyTier) -> u32 {
    tier.weight()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn tiers_order_by_weight() {
        assert!(ProficiencyTier::Primary > ProficiencyTier::Secondary);
        assert!(ProficiencyTier::Unconfident > ProficiencyTier::Unusable);
        let weights: Vec<u32> = ProficiencyTier::ALL.iter().map(|t| weight_of(*t)).collect();
        assert_eq!(weights, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn missing_rating_is_unusable() {
        let mut proficiency = BTreeMap::new();
        proficiency.insert("X".to_string(), ProficiencyTier::Primary);
        let player = Player {
            id: 1,
            name: "ann".to_string(),
            proficiency,
        };
        assert_eq!(tier_of(&player, "X"), ProficiencyTier::Primary);
        assert_eq!(tier_of(&player, "missing"), ProficiencyTier::Unusable);
        assert!(!tier_of(&player, "missing").is_usable());
    }

    #[test]
    fn tier_serializes_snake_case() {
        let json = serde_json::to_string(&ProficiencyTier::Unconfident).expect("serialize");
        assert_eq!(json, "\"unconfident\"");
        let parsed: ProficiencyTier = serde_json::from_str("\"primary\"").expect("parse");
        assert_eq!(parsed, ProficiencyTier::Primary);
    }
}
