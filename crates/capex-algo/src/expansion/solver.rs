//! Extensive-form solve of a single scenario instance
//!
//! Useful as a reference point for PH: the deterministic optimum of each
//! scenario and the build decisions it implies.

use super::{BUILD_GEN, INVESTMENT_COST, OPERATING_COST};
use capex_core::{CapexError, CapexResult, ModelInstance};
use good_lp::solvers::clarabel::clarabel;
use good_lp::{Solution, SolverModel};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Capacity built for one project in one period
#[derive(Debug, Clone, Serialize)]
pub struct BuildDecision {
    pub project: String,
    pub period: String,
    pub capacity_mw: f64,
}

impl BuildDecision {
    pub fn is_built(&self) -> bool {
        self.capacity_mw > 1e-6
    }
}

/// Optimal solution of one scenario instance
#[derive(Debug, Clone, Serialize)]
pub struct ExpansionSolution {
    pub scenario: String,
    /// Investment cost + operating cost
    pub total_cost: f64,
    pub investment_cost: f64,
    pub operating_cost: f64,
    pub build_decisions: Vec<BuildDecision>,
    pub solve_time_ms: f64,
}

impl ExpansionSolution {
    pub fn total_capacity_mw(&self) -> f64 {
        self.build_decisions.iter().map(|d| d.capacity_mw).sum()
    }
}

/// Solve `model` (minimizing `InvestmentCost + OperatingCost`) with Clarabel.
pub fn solve_instance(model: ModelInstance) -> CapexResult<ExpansionSolution> {
    let start = Instant::now();
    let scenario = model.name().to_string();

    let investment = model
        .find_expression(INVESTMENT_COST)
        .cloned()
        .ok_or_else(|| CapexError::Model(format!("{} not defined", INVESTMENT_COST)))?;
    let operating = model
        .find_expression(OPERATING_COST)
        .cloned()
        .ok_or_else(|| CapexError::Model(format!("{} not defined", OPERATING_COST)))?;
    let builds: Vec<_> = model
        .var_component(BUILD_GEN)
        .map(|component| {
            component
                .iter()
                .map(|(index, var)| (index.clone(), var.variable))
                .collect()
        })
        .unwrap_or_default();

    let (vars, constraints) = model.into_parts();
    let mut problem = vars
        .minimise(investment.clone() + operating.clone())
        .using(clarabel);
    for constraint in constraints {
        problem = problem.with(constraint);
    }

    let solution = problem
        .solve()
        .map_err(|e| CapexError::Solver(format!("scenario '{}': {:?}", scenario, e)))?;

    let build_decisions = builds
        .into_iter()
        .map(|(index, var)| BuildDecision {
            project: index.first().cloned().unwrap_or_default(),
            period: index.get(1).cloned().unwrap_or_default(),
            capacity_mw: solution.value(var).max(0.0),
        })
        .collect();

    let investment_cost = solution.eval(&investment);
    let operating_cost = solution.eval(&operating);
    let result = ExpansionSolution {
        scenario,
        total_cost: investment_cost + operating_cost,
        investment_cost,
        operating_cost,
        build_decisions,
        solve_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    info!(
        scenario = %result.scenario,
        total_cost = result.total_cost,
        "solved expansion instance"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::{build_instance, ExpansionOptions};
    use capex_core::ModelData;

    // Single zone, one period, crf(0, 1) = 1: building exactly the peak
    // demand of 100 MW is optimal.
    const DATA: &str = r#"
discount_rate: 0.0
load_zones: [Z]
periods: ["2030"]
timeseries:
  - { id: day, period: "2030", hours_per_timepoint: 1, timepoints: [t1, t2] }
zone_demand:
  - { zone: Z, timepoint: t1, demand_mw: 100 }
  - { zone: Z, timepoint: t2, demand_mw: 60 }
projects:
  - { name: gas, zone: Z, capital_cost_per_mw: 10, lifetime_years: 1, variable_cost_per_mwh: 2 }
"#;

    #[test]
    fn test_builds_peak_capacity() {
        let data: ModelData = serde_yaml::from_str(DATA).unwrap();
        let spec = &data.resolve_scenarios().unwrap()[0];
        let model = build_instance(&data, spec, &ExpansionOptions::default()).unwrap();

        let solution = solve_instance(model).unwrap();
        assert_eq!(solution.build_decisions.len(), 1);
        assert!((solution.build_decisions[0].capacity_mw - 100.0).abs() < 1e-3);
        assert!((solution.investment_cost - 1000.0).abs() < 1e-2);
        assert!((solution.operating_cost - 320.0).abs() < 1e-2);
    }

    #[test]
    fn test_demand_response_flattens_peak() {
        let data: ModelData = serde_yaml::from_str(DATA).unwrap();
        let spec = &data.resolve_scenarios().unwrap()[0];
        let options = ExpansionOptions {
            demand_response: true,
            ..Default::default()
        };
        let model = build_instance(&data, spec, &options).unwrap();

        // 10% of 100 MW moves from t1 to t2: peak becomes 90 MW
        let solution = solve_instance(model).unwrap();
        assert!((solution.total_capacity_mw() - 90.0).abs() < 1e-3);
    }
}
