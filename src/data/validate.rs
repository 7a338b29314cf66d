use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::roster::{LockSet, Player};
use crate::optimizer::proficiency::tier_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Checks a catalog, roster and lock set for inconsistencies the optimizer would silently absorb.
/// The optimizer never calls this; callers decide whether errors block a run.
pub fn validate_setup(catalog: &Catalog, players: &[Player], locks: &LockSet) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_catalog(&mut report, catalog);
    validate_players(&mut report, catalog, players);
    validate_locks(&mut report, catalog, players, locks);
    report
}

fn validate_catalog(report: &mut ValidationReport, catalog: &Catalog) {
    let mut seen = HashSet::new();
    for (index, unit) in catalog.iter().enumerate() {
        let context = format!("units[{index}]");
        if unit.name.trim().is_empty() {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.name"),
                "missing non-empty 'name'",
            );
        } else if !seen.insert(unit.name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.name"),
                format!("duplicate unit name '{}'", unit.name),
            );
        }
        if unit.cost == 0 {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.cost"),
                format!("unit '{}' must cost at least 1 point", unit.name),
            );
        }
    }
}

fn validate_players(report: &mut ValidationReport, catalog: &Catalog, players: &[Player]) {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();

    for (index, player) in players.iter().enumerate() {
        let context = format!("players[{index}]");
        if !seen_ids.insert(player.id) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.id"),
                format!("duplicate player id {}", player.id),
            );
        }
        if player.name.trim().is_empty() {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.name"),
                "missing non-empty 'name'",
            );
        } else if !seen_names.insert(player.name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.name"),
                format!("duplicate player name '{}'", player.name),
            );
        }

        for unit in player.proficiency.keys() {
            if !catalog.contains(unit) {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{context}.proficiency"),
                    format!("rating for unknown unit '{unit}' is ignored"),
                );
            }
        }

        let usable = catalog
            .iter()
            .any(|unit| tier_of(player, &unit.name).is_usable());
        if !usable {
            report.push(
                ValidationSeverity::Info,
                context,
                format!("player '{}' has no usable unit", player.name),
            );
        }
    }
}

fn validate_locks(
    report: &mut ValidationReport,
    catalog: &Catalog,
    players: &[Player],
    locks: &LockSet,
) {
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for (player_name, unit) in locks.iter() {
        let context = format!("locks['{player_name}']");
        let player = players.iter().find(|p| p.name == player_name);
        if player.is_none() {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                format!("lock refers to unknown player '{player_name}'"),
            );
        }
        if !catalog.contains(unit) {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                format!("lock refers to unknown unit '{unit}'"),
            );
        } else if let Some(player) = player {
            if !tier_of(player, unit).is_usable() {
                report.push(
                    ValidationSeverity::Warning,
                    context.clone(),
                    format!("'{player_name}' cannot use pinned unit '{unit}' and will receive nothing"),
                );
            }
        }
        if let Some(previous) = owners.insert(unit, player_name) {
            report.push(
                ValidationSeverity::Error,
                context,
                format!("unit '{unit}' is pinned to both '{previous}' and '{player_name}'"),
            );
        }
    }
}
