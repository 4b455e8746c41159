//! Progressive hedging CLI commands

use anyhow::{Context, Result};
use capex_algo::expansion::build_scenario_tree;
use capex_algo::ph::{apply_to_all_scenarios, CostProportionalRho, RhoEntry, RhoReport, RhoTable};
use capex_cli::cli::{DemandResponseArgs, PhCommands};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::commands::util::{expansion_options, load_model, write_json};

#[derive(Debug, Serialize)]
struct RhoOutput {
    model: String,
    cost_expression: String,
    rho_coefficient: f64,
    rhos: Vec<RhoEntry>,
    reports: Vec<RhoReport>,
}

pub fn handle(command: &PhCommands) -> Result<()> {
    match command {
        PhCommands::Rho {
            model,
            cost_expression,
            rho_coefficient,
            demand_response,
            dr,
            out,
        } => handle_rho(
            model,
            cost_expression,
            *rho_coefficient,
            *demand_response,
            dr,
            out.as_deref(),
        ),
    }
}

fn handle_rho(
    model_path: &Path,
    cost_expression: &str,
    rho_coefficient: f64,
    demand_response: bool,
    dr: &DemandResponseArgs,
    out: Option<&Path>,
) -> Result<()> {
    let data = load_model(model_path)?;
    let options = expansion_options(demand_response, dr)?;
    let tree = build_scenario_tree(&data, &options).context("building scenario tree")?;

    let callback = CostProportionalRho::new(cost_expression, rho_coefficient);
    let mut table = RhoTable::new();
    let reports =
        apply_to_all_scenarios(&callback, &mut table, &tree).context("setting rho values")?;

    let unassigned: usize = reports.iter().map(|r| r.unassigned.len()).sum();
    info!(
        scenarios = reports.len(),
        rhos = table.len(),
        unassigned,
        "cost-proportional rho complete"
    );

    let output = RhoOutput {
        model: data.name.clone(),
        cost_expression: cost_expression.to_string(),
        rho_coefficient,
        rhos: table.entries(),
        reports,
    };
    write_json(&output, out)?;

    eprintln!("\nCP({}) rho from {}:", rho_coefficient, cost_expression);
    for report in &output.reports {
        eprintln!(
            "  {}: {} set, {} without tree node",
            report.scenario,
            report.assigned,
            report.unassigned.len()
        );
    }
    Ok(())
}
