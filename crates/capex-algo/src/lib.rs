//! # capex-algo: algorithms for stochastic capacity expansion
//!
//! ## Progressive Hedging
//!
//! The [`ph`] module sets PH rho values proportional to first-stage cost
//! coefficients:
//!
//! | Item | Role |
//! |------|------|
//! | [`ph::extract_cost_coefficients`] | canonical linear form → `{id → coefficient}`, `{id → name}` |
//! | [`ph::assign_rho`] | first owning tree node receives `coefficient · scale` |
//! | [`ph::CostProportionalRho`] | per-scenario callback tying both to a [`ph::RhoSetter`] |
//!
//! ## Model Contributors
//!
//! - [`demand_response`]: shiftable load with daily net-zero balance and
//!   optional spinning reserve provision
//! - [`expansion`]: the reference two-stage expansion model the contributors
//!   and the callback run against, plus a per-scenario Clarabel solve
//!
//! ## Example
//!
//! ```ignore
//! use capex_algo::expansion::{build_scenario_tree, ExpansionOptions};
//! use capex_algo::ph::{apply_to_all_scenarios, CostProportionalRho, RhoTable};
//! use capex_core::ModelData;
//!
//! let data = ModelData::from_path("model.yaml".as_ref())?;
//! let tree = build_scenario_tree(&data, &ExpansionOptions::default())?;
//!
//! let mut rhos = RhoTable::new();
//! let reports = apply_to_all_scenarios(&CostProportionalRho::default(), &mut rhos, &tree)?;
//! println!("{} rho values set", rhos.len());
//! ```

pub mod demand_response;
pub mod expansion;
pub mod ph;

pub use demand_response::{DemandResponseOptions, DemandResponseSummary};
pub use expansion::{
    build_instance, build_scenario_tree, solve_instance, ExpansionOptions, ExpansionSolution,
};
pub use ph::{
    apply_to_all_scenarios, assign_rho, extract_cost_coefficients, CostProportionalRho,
    RhoError, RhoReport, RhoSetter, RhoSetterCallback, RhoTable,
};
