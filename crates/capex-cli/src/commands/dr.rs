//! Demand response CLI commands

use anyhow::{anyhow, Context, Result};
use capex_algo::expansion::build_instance_with_summary;
use capex_cli::cli::{DemandResponseArgs, DrCommands};
use std::path::Path;

use crate::commands::util::{expansion_options, load_model, write_json};

pub fn handle(command: &DrCommands) -> Result<()> {
    match command {
        DrCommands::Inspect {
            model,
            scenario,
            dr,
            out,
        } => handle_inspect(model, scenario.as_deref(), dr, out.as_deref()),
    }
}

fn handle_inspect(
    model_path: &Path,
    scenario: Option<&str>,
    dr: &DemandResponseArgs,
    out: Option<&Path>,
) -> Result<()> {
    let data = load_model(model_path)?;
    let scenarios = data.resolve_scenarios()?;
    let spec = match scenario {
        Some(name) => scenarios
            .iter()
            .find(|s| s.scenario_id == name)
            .ok_or_else(|| anyhow!("scenario '{}' not found in model data", name))?,
        None => scenarios
            .first()
            .ok_or_else(|| anyhow!("model data has no scenarios"))?,
    };

    let options = expansion_options(true, dr)?;
    let (_, summary) = build_instance_with_summary(&data, spec, &options)
        .with_context(|| format!("building scenario '{}'", spec.scenario_id))?;
    let summary = summary.ok_or_else(|| anyhow!("demand response components were not added"))?;

    write_json(&summary, out)?;

    eprintln!("\nDemand response ({}):", spec.scenario_id);
    eprintln!("  ShiftDemand variables: {}", summary.shift_variables);
    eprintln!("  Net-zero constraints: {}", summary.net_zero_constraints);
    eprintln!("  Reserve expressions: {}", summary.reserve_expressions);
    for (period, share) in &summary.max_share {
        eprintln!(
            "  {}: max share {:.3}, shiftable {:.1} MW",
            period,
            share,
            summary.shiftable_mw.get(period).copied().unwrap_or(0.0)
        );
    }
    for issue in &summary.diagnostics.issues {
        eprintln!("  {}", issue);
    }
    Ok(())
}
