//! # capex-core: model layer for stochastic capacity expansion
//!
//! Provides the data structures shared by the capex algorithms:
//!
//! - [`ModelInstance`] - named, indexed variables/expressions/constraints on
//!   top of `good_lp`, plus registries other modules append to
//! - [`SymbolMap`] / [`SymbolResolver`] - stable [`VariableId`]s for variables
//! - [`ScenarioTree`] - nodes owning variable ids, scenarios owning instances
//! - [`ModelData`] - YAML/JSON model data (zones, periods, timeseries, projects)
//! - [`diagnostics`] - non-fatal issue collection
//!
//! ## Quick Start
//!
//! ```rust
//! use capex_core::*;
//!
//! let mut model = ModelInstance::new("toy");
//! model.declare_var("BuildGen", 1).unwrap();
//! let build = model
//!     .add_var("BuildGen", index_key(&["solar", "2030"]), Bounds::non_negative())
//!     .unwrap();
//! model
//!     .add_expression("InvestmentCost", vec![], 95_000.0 * build)
//!     .unwrap();
//!
//! let id = model.symbol_map().id(build).unwrap();
//! let root = ScenarioTreeNode::new("RootNode", 1).with_variable_ids([id]);
//! assert!(root.contains_variable(&id));
//! ```

pub mod data;
pub mod diagnostics;
pub mod error;
pub mod financials;
pub mod model;
pub mod scenario_tree;
pub mod symbol_map;

pub use data::{ModelData, ProjectSpec, ScenarioSpec, TimeseriesSpec, ZoneDemand};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{CapexError, CapexResult};
pub use financials::capital_recovery_factor;
pub use model::{
    full_name, index_key, Bounds, ConstraintSense, IndexKey, LinearConstraint, ModelInstance,
    ModelVar, VarComponent,
};
pub use scenario_tree::{Scenario, ScenarioTree, ScenarioTreeNode, VariableMembership};
pub use symbol_map::{Symbol, SymbolMap, SymbolResolver, VariableId};
