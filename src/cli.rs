use std::env;
use std::fmt::Write as _;

use serde::Serialize;

use crate::data::catalog::{load_catalog, Catalog};
use crate::data::roster::{load_roster, RosterFile, DEFAULT_BUDGET};
use crate::data::validate::{validate_setup, ValidationSeverity};
use crate::optimizer::enumerator::TeamRow;
use crate::optimizer::knapsack::{optimize_all_players, player_point_patterns};
use crate::optimizer::{optimize_scenario, Objective, OptimizationScenario, ScenarioOutcome, SearchLimits};
use crate::server;
use crate::server::api::catalog_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Team,
    Players,
    Patterns,
    Balanced,
    Priority,
    Validate,
}

const USAGE: &str = "usage: ratio-advisor <serve|team|players|patterns|balanced|priority|validate>";

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("team") => Some(Command::Team),
        Some("players") => Some(Command::Players),
        Some("patterns") => Some(Command::Patterns),
        Some("balanced") => Some(Command::Balanced),
        Some("priority") => Some(Command::Priority),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Team) => handle_scenario(args, Objective::Team, "team"),
        Some(Command::Players) => handle_players(args),
        Some(Command::Patterns) => handle_patterns(args),
        Some(Command::Balanced) => handle_scenario(args, Objective::Balanced, "balanced"),
        Some(Command::Priority) => handle_priority(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var(server::BIND_ENV).unwrap_or_else(|_| server::DEFAULT_BIND_ADDR.to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

/// Positional arguments after the command name; flags are skipped.
fn positionals(args: &[String]) -> Vec<&String> {
    args.iter().skip(2).filter(|arg| !arg.starts_with("--")).collect()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

/// Roster file plus the catalog it should be run against: the inline `units` when
/// present, otherwise the configured catalog file.
fn load_inputs(path: &str) -> Result<(RosterFile, Catalog), String> {
    let mut roster = load_roster(path).map_err(|err| err.to_string())?;
    let catalog = match roster.units.take() {
        Some(units) => Catalog::new(units),
        None => load_catalog(catalog_path()).map_err(|err| err.to_string())?,
    };
    Ok((roster, catalog))
}

fn resolve_budget(raw: Option<&String>, roster: &RosterFile) -> u32 {
    let default = roster.budget.unwrap_or(DEFAULT_BUDGET);
    parse_u32_arg(raw, "budget", default)
}

fn handle_scenario(args: &[String], objective: Objective, command: &str) -> i32 {
    let positional = positionals(args);
    let Some(path) = positional.first() else {
        eprintln!("usage: ratio-advisor {command} <roster.json> [budget]");
        return 2;
    };
    let (roster, catalog) = match load_inputs(path) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("failed to load roster: {err}");
            return 1;
        }
    };
    let budget = resolve_budget(positional.get(1).copied(), &roster);
    let seed = positional.get(2).copied().map(|raw| parse_u64_arg(Some(raw), "seed", 0));

    let scenario = OptimizationScenario {
        objective,
        seed,
        locks: Some(&roster.locks),
        ..OptimizationScenario::new(&roster.players, &catalog, budget)
    };
    print_json(&optimize_scenario(&scenario))
}

fn handle_players(args: &[String]) -> i32 {
    let positional = positionals(args);
    let Some(path) = positional.first() else {
        eprintln!("usage: ratio-advisor players <roster.json> [budget] [--points]");
        return 2;
    };
    let (roster, catalog) = match load_inputs(path) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("failed to load roster: {err}");
            return 1;
        }
    };
    let budget = resolve_budget(positional.get(1).copied(), &roster);

    if has_flag(args, "--points") {
        print_json(&player_point_patterns(
            &roster.players,
            &catalog,
            budget,
            &SearchLimits::default(),
        ))
    } else {
        print_json(&optimize_all_players(
            &roster.players,
            &catalog,
            budget,
            Some(&roster.locks),
        ))
    }
}

fn handle_patterns(args: &[String]) -> i32 {
    let positional = positionals(args);
    let Some(path) = positional.first() else {
        eprintln!("usage: ratio-advisor patterns <roster.json> [budget] [--primary-first] [--table]");
        return 2;
    };
    let (roster, catalog) = match load_inputs(path) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("failed to load roster: {err}");
            return 1;
        }
    };
    let budget = resolve_budget(positional.get(1).copied(), &roster);
    let objective = if has_flag(args, "--primary-first") {
        Objective::PrimaryFirst
    } else {
        Objective::Patterns
    };

    let scenario = OptimizationScenario {
        objective,
        locks: Some(&roster.locks),
        ..OptimizationScenario::new(&roster.players, &catalog, budget)
    };
    let outcome = optimize_scenario(&scenario);

    match (&outcome, has_flag(args, "--table")) {
        (ScenarioOutcome::Rows(rows), true) => {
            let names: Vec<&str> = roster.players.iter().map(|p| p.name.as_str()).collect();
            print!("{}", rows_table(rows, &names));
            0
        }
        _ => print_json(&outcome),
    }
}

fn handle_priority(args: &[String]) -> i32 {
    let positional = positionals(args);
    let (Some(path), Some(player)) = (positional.first(), positional.get(1)) else {
        eprintln!("usage: ratio-advisor priority <roster.json> <player> [budget] [unit...]");
        return 2;
    };
    let (roster, catalog) = match load_inputs(path) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("failed to load roster: {err}");
            return 1;
        }
    };

    // A numeric third argument is the budget; everything after it names units.
    let (budget, unit_args) = match positional.get(2).and_then(|raw| raw.parse::<u32>().ok()) {
        Some(budget) => (budget, &positional[3..]),
        None => (
            roster.budget.unwrap_or(DEFAULT_BUDGET),
            positional.get(2..).unwrap_or_default(),
        ),
    };
    let units: Vec<String> = unit_args.iter().map(|unit| unit.to_string()).collect();

    let scenario = OptimizationScenario {
        objective: Objective::Priority,
        locks: Some(&roster.locks),
        priority_player: Some(player.as_str()),
        priority_units: &units,
        ..OptimizationScenario::new(&roster.players, &catalog, budget)
    };
    print_json(&optimize_scenario(&scenario))
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = positionals(args).first().copied() else {
        eprintln!("usage: ratio-advisor validate <roster.json>");
        return 2;
    };
    let (roster, catalog) = match load_inputs(path) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("failed to load roster: {err}");
            return 1;
        }
    };

    let report = validate_setup(&catalog, &roster.players, &roster.locks);
    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    if report.has_errors() {
        eprintln!(
            "validation failed: {} error(s), {} warning(s)",
            report.count(ValidationSeverity::Error),
            report.count(ValidationSeverity::Warning)
        );
        1
    } else {
        println!(
            "validation passed: {path} ({} warning(s), {} note(s))",
            report.count(ValidationSeverity::Warning),
            report.count(ValidationSeverity::Info)
        );
        0
    }
}

/// Tab-separated rows, one column per player; `-` marks a player with no unit.
pub fn rows_table(rows: &[TeamRow], players: &[&str]) -> String {
    let mut out = String::from("rank\tcost\tweight\tprimary\tefficiency");
    for name in players {
        let _ = write!(out, "\t{name}");
    }
    out.push('\n');

    for (rank, row) in rows.iter().enumerate() {
        let _ = write!(
            out,
            "{}\t{}\t{}\t{}\t{:.2}",
            rank + 1,
            row.total_cost,
            row.total_weight,
            row.primary_count,
            row.efficiency
        );
        for name in players {
            let units: Vec<&str> = row
                .assignments_for(name)
                .iter()
                .map(|a| a.unit.as_str())
                .collect();
            let cell = if units.is_empty() { "-".to_string() } else { units.join("+") };
            let _ = write!(out, "\t{cell}");
        }
        out.push('\n');
    }
    out
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize result: {err}");
            1
        }
    }
}

fn parse_u32_arg(raw: Option<&String>, name: &str, default: u32) -> u32 {
    raw.and_then(|value| value.parse::<u32>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
