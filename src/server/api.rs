use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::catalog::{load_catalog, Catalog, Unit, DEFAULT_CATALOG_PATH};
use crate::data::roster::{LockSet, Player, DEFAULT_BUDGET};
use crate::data::validate::validate_setup;
use crate::data::DataError;
use crate::optimizer::balanced::balanced_team_rows;
use crate::optimizer::enumerator::team_patterns;
use crate::optimizer::knapsack::optimize_player;
use crate::optimizer::priority::{optimization_overview, priority_patterns};
use crate::optimizer::ranking::RowOrder;
use crate::optimizer::team::optimize_team;
use crate::optimizer::{scenario_rng, SearchLimits};

pub const MAX_BUDGET: i64 = 500;
pub const CATALOG_ENV: &str = "RATIO_CATALOG";

/// Shared body of every POST route. Fields a route does not use are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdvisorRequest {
    pub players: Vec<Player>,
    /// Inline catalog; the configured catalog file is used when absent.
    pub units: Option<Vec<Unit>>,
    pub budget: Option<i64>,
    pub locks: LockSet,
    pub seed: Option<u64>,
    pub player: Option<String>,
    pub priority_units: Vec<String>,
    pub order: RowOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorResponse<T> {
    pub status: &'static str,
    pub budget: u32,
    pub result: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid request")]
    Validation(ValidationErrorResponse),
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] DataError),
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

fn encode<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(ApiError::Encode)
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "ratio-advisor-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn catalog_path() -> String {
    env::var(CATALOG_ENV).unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string())
}

pub fn catalog_payload() -> Result<String, ApiError> {
    let catalog = load_catalog(catalog_path())?;
    encode(&catalog)
}

/// A parsed, validated request ready for the optimizer.
struct Prepared {
    request: AdvisorRequest,
    catalog: Catalog,
    budget: u32,
}

impl Prepared {
    fn locks(&self) -> Option<&LockSet> {
        (!self.request.locks.is_empty()).then_some(&self.request.locks)
    }

    fn respond<T: Serialize>(&self, result: T) -> Result<String, ApiError> {
        encode(&AdvisorResponse {
            status: "ok",
            budget: self.budget,
            result,
        })
    }
}

/// Negative budgets clamp to 0; anything above [MAX_BUDGET] is rejected.
fn resolve_budget(raw: Option<i64>, errors: &mut Vec<ValidationIssue>) -> u32 {
    let budget = raw.unwrap_or(i64::from(DEFAULT_BUDGET));
    if budget > MAX_BUDGET {
        errors.push(ValidationIssue {
            field: "budget".to_string(),
            messages: vec![format!("must be at most {MAX_BUDGET}")],
        });
        return 0;
    }
    u32::try_from(budget.max(0)).unwrap_or(0)
}

fn prepare(body: &str, needs_player: bool) -> Result<Prepared, ApiError> {
    let mut request: AdvisorRequest = serde_json::from_str(body)?;
    let catalog = match request.units.take() {
        Some(units) => Catalog::new(units),
        None => load_catalog(catalog_path())?,
    };

    let mut errors = Vec::new();
    let budget = resolve_budget(request.budget, &mut errors);

    if needs_player {
        match request.player.as_deref() {
            None => errors.push(ValidationIssue {
                field: "player".to_string(),
                messages: vec!["is required".to_string()],
            }),
            Some(name) if !request.players.iter().any(|p| p.name == name) => {
                errors.push(ValidationIssue {
                    field: "player".to_string(),
                    messages: vec![format!("'{name}' is not in players")],
                });
            }
            Some(_) => {}
        }
    }

    let owner = request.player.as_deref().unwrap_or_default();
    let unit_messages: Vec<String> = request
        .priority_units
        .iter()
        .filter_map(|unit| {
            if !catalog.contains(unit) {
                Some(format!("unknown unit '{unit}'"))
            } else if request.locks.is_pinned_to_other(unit, owner) {
                Some(format!("'{unit}' is pinned to another player"))
            } else {
                None
            }
        })
        .collect();
    if !unit_messages.is_empty() {
        errors.push(ValidationIssue {
            field: "priority_units".to_string(),
            messages: unit_messages,
        });
    }

    let report = validate_setup(&catalog, &request.players, &request.locks);
    errors.extend(report.errors().map(|diag| ValidationIssue {
        field: diag.context.clone(),
        messages: vec![diag.message.clone()],
    }));

    if !errors.is_empty() {
        return Err(ApiError::Validation(ValidationErrorResponse {
            status: "error",
            message: "Validation failed",
            errors,
        }));
    }

    Ok(Prepared {
        request,
        catalog,
        budget,
    })
}

pub fn optimize_player_payload(body: &str) -> Result<String, ApiError> {
    let prepared = prepare(body, true)?;
    let name = prepared.request.player.as_deref().unwrap_or_default();
    let Some(player) = prepared.request.players.iter().find(|p| p.name == name) else {
        return prepared.respond(None::<()>);
    };
    let result = optimize_player(player, &prepared.catalog, prepared.budget, prepared.locks());
    prepared.respond(result)
}

pub fn optimize_team_payload(body: &str) -> Result<String, ApiError> {
    let prepared = prepare(body, false)?;
    let result = optimize_team(
        &prepared.request.players,
        &prepared.catalog,
        prepared.budget,
        prepared.locks(),
    );
    prepared.respond(result)
}

pub fn patterns_payload(body: &str) -> Result<String, ApiError> {
    let prepared = prepare(body, false)?;
    let rows = team_patterns(
        &prepared.request.players,
        &prepared.catalog,
        prepared.budget,
        prepared.locks(),
        &SearchLimits::default(),
        prepared.request.order,
    );
    prepared.respond(rows)
}

pub fn balanced_patterns_payload(body: &str) -> Result<String, ApiError> {
    let prepared = prepare(body, false)?;
    let mut rng = scenario_rng(prepared.request.seed);
    let rows = balanced_team_rows(
        &prepared.request.players,
        &prepared.catalog,
        prepared.budget,
        prepared.locks(),
        &SearchLimits::default(),
        &mut rng,
    );
    prepared.respond(rows)
}

pub fn priority_payload(body: &str) -> Result<String, ApiError> {
    let prepared = prepare(body, true)?;
    let patterns = priority_patterns(
        &prepared.request.players,
        &prepared.catalog,
        prepared.budget,
        prepared.locks(),
        prepared.request.player.as_deref().unwrap_or_default(),
        &prepared.request.priority_units,
        &SearchLimits::default(),
    );
    prepared.respond(patterns)
}

pub fn overview_payload(body: &str) -> Result<String, ApiError> {
    let prepared = prepare(body, false)?;
    let overview = optimization_overview(
        &prepared.request.players,
        &prepared.catalog,
        prepared.budget,
        prepared.locks(),
        &SearchLimits::default(),
    );
    prepared.respond(overview)
}
