//! Progressive Hedging (PH) rho setting
//!
//! PH solves a stochastic program by solving each scenario separately and
//! penalizing disagreement on the non-anticipative (first-stage) variables.
//! The penalty weight of each variable is its rho. This module implements
//! the cost-proportional rule restricted to first-stage variables:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CP(rho) FOR FIRST-STAGE VARIABLES                                       │
//! │  ─────────────────────────────────                                       │
//! │                                                                          │
//! │  InvestmentCost = Σ c_i · x_i           (canonical linear form)          │
//! │        │                                                                 │
//! │        ▼  extract_cost_coefficients                                      │
//! │  { id(x_i) → c_i },  { id(x_i) → name(x_i) }                             │
//! │        │                                                                 │
//! │        ▼  assign_rho(scale = rho_coefficient)                            │
//! │  for each x_i: first node in the scenario's node list owning x_i         │
//! │                receives rho_i = c_i · rho_coefficient                    │
//! │                no owner → warning, rho not set                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References
//!
//! - **Watson & Woodruff (2011)**: "Progressive hedging innovations for a
//!   class of stochastic mixed-integer resource allocation problems"
//!   - CP(1.0) trades convergence speed against solution quality well

mod callback;
mod coefficients;
mod error;
mod rho;

pub use callback::{
    apply_to_all_scenarios, CostProportionalRho, RhoEntry, RhoReport, RhoSetter,
    RhoSetterCallback, RhoTable, DEFAULT_COST_EXPRESSION, DEFAULT_RHO_COEFFICIENT,
};
pub use coefficients::{extract_cost_coefficients, CanonicalLinear, CoefficientMap, NameMap};
pub use error::RhoError;
pub use rho::assign_rho;
