//! Model data CLI commands

use anyhow::{anyhow, Context, Result};
use capex_algo::expansion::{build_instance, solve_instance, ExpansionSolution};
use capex_cli::cli::{DemandResponseArgs, ModelCommands};
use std::path::Path;

use crate::commands::util::{expansion_options, load_model, write_json};

pub fn handle(command: &ModelCommands) -> Result<()> {
    match command {
        ModelCommands::Validate { model } => handle_validate(model),
        ModelCommands::Solve {
            model,
            scenario,
            demand_response,
            dr,
            out,
        } => handle_solve(model, scenario.as_deref(), *demand_response, dr, out.as_deref()),
    }
}

fn handle_validate(model_path: &Path) -> Result<()> {
    let data = load_model(model_path)?;
    let scenarios = data.resolve_scenarios()?;

    eprintln!("Model data file is valid");
    eprintln!("  Name: {}", data.name);
    eprintln!("  Load zones: {}", data.load_zones.len());
    eprintln!("  Periods: {}", data.periods.len());
    eprintln!(
        "  Timeseries: {} ({} timepoints)",
        data.timeseries.len(),
        data.timepoints().len()
    );
    eprintln!("  Projects: {}", data.projects.len());
    eprintln!("  Scenarios: {}", scenarios.len());

    if data.projects.is_empty() {
        eprintln!("  Warning: no candidate projects; demand cannot be served");
    }
    let served: Vec<&str> = data.projects.iter().map(|p| p.zone.as_str()).collect();
    for zone in &data.load_zones {
        if !served.contains(&zone.as_str()) {
            eprintln!("  Warning: load zone '{}' has no candidate projects", zone);
        }
    }
    Ok(())
}

fn handle_solve(
    model_path: &Path,
    scenario: Option<&str>,
    demand_response: bool,
    dr: &DemandResponseArgs,
    out: Option<&Path>,
) -> Result<()> {
    let data = load_model(model_path)?;
    let options = expansion_options(demand_response, dr)?;
    let scenarios: Vec<_> = data
        .resolve_scenarios()?
        .into_iter()
        .filter(|s| scenario.map_or(true, |name| s.scenario_id == name))
        .collect();
    if scenarios.is_empty() {
        return Err(anyhow!(
            "scenario '{}' not found in model data",
            scenario.unwrap_or_default()
        ));
    }

    let mut solutions: Vec<ExpansionSolution> = Vec::with_capacity(scenarios.len());
    for spec in &scenarios {
        let instance = build_instance(&data, spec, &options)
            .with_context(|| format!("building scenario '{}'", spec.scenario_id))?;
        let solution = solve_instance(instance)
            .with_context(|| format!("solving scenario '{}'", spec.scenario_id))?;
        solutions.push(solution);
    }

    write_json(&solutions, out)?;

    eprintln!("\nExpansion solutions:");
    for solution in &solutions {
        eprintln!(
            "  {}: total ${:.2} (investment ${:.2}, operating ${:.2}), {:.1} MW built",
            solution.scenario,
            solution.total_cost,
            solution.investment_cost,
            solution.operating_cost,
            solution.total_capacity_mw()
        );
    }
    Ok(())
}
