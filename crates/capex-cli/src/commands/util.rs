use anyhow::{Context, Result};
use capex_algo::demand_response::{load_inputs, DemandResponseOptions};
use capex_algo::ExpansionOptions;
use capex_cli::cli::DemandResponseArgs;
use capex_core::ModelData;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

pub fn load_model(path: &Path) -> Result<ModelData> {
    let data = ModelData::from_path(path)?;
    info!(
        model = %data.name,
        zones = data.load_zones.len(),
        periods = data.periods.len(),
        projects = data.projects.len(),
        "loaded model data from {}",
        path.display()
    );
    Ok(data)
}

pub fn expansion_options(demand_response: bool, args: &DemandResponseArgs) -> Result<ExpansionOptions> {
    let shares = match (&args.inputs_dir, demand_response) {
        (Some(dir), true) => load_inputs(dir)
            .with_context(|| format!("loading demand response inputs from {}", dir.display()))?,
        (Some(dir), false) => {
            warn!(
                inputs_dir = %dir.display(),
                "--inputs-dir ignored without --demand-response"
            );
            BTreeMap::new()
        }
        (None, _) => BTreeMap::new(),
    };
    Ok(ExpansionOptions {
        demand_response,
        demand_response_options: DemandResponseOptions {
            demand_response_share: args.demand_response_share,
        },
        demand_response_shares: shares,
    })
}

/// Pretty JSON to `out`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Results written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}
