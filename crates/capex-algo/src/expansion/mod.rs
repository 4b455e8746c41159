//! Reference two-stage capacity expansion model
//!
//! Builds one [`ModelInstance`] per scenario from [`ModelData`] and arranges
//! them in a two-stage [`ScenarioTree`] for progressive hedging.
//!
//! ## Formulation
//!
//! ```text
//! minimize    InvestmentCost + OperatingCost
//!
//! InvestmentCost = Σ_{g,p} capital_cost_g · crf(r, life_g) · BuildGen[g,p]        (stage 1)
//! OperatingCost  = Σ_{g,t} variable_cost_g · hours_t · DispatchGen[g,t]          (stage 2)
//!
//! subject to:
//!   DispatchGen[g,t] ≤ Σ_{p ≤ period(t)} BuildGen[g,p]     Dispatch_Within_Capacity[g,t]
//!   Σ_{g ∈ z} DispatchGen[g,t] − Σ Zone_Power_Withdrawals[z,t]
//!       = load_scale · demand[z,t]                         Zone_Energy_Balance[z,t]
//!   BuildGen, DispatchGen ≥ 0
//! ```
//!
//! Other modules (e.g. [`crate::demand_response`]) extend the energy balance
//! by appending component names to the `Zone_Power_Withdrawals` registry
//! before the balance is built.
//!
//! ## Scenario Tree
//!
//! ```text
//!                 RootNode  (BuildGen[*])
//!               /    |    \
//!         LowNode  ...   HighNode   (DispatchGen[*], ShiftDemand[*])
//! ```

mod solver;

pub use solver::{solve_instance, BuildDecision, ExpansionSolution};

use crate::demand_response::{self, DemandResponseOptions, DemandResponseSummary};
use capex_core::{
    capital_recovery_factor, index_key, Bounds, CapexError, CapexResult, ConstraintSense,
    ModelData, ModelInstance, Scenario, ScenarioSpec, ScenarioTree, ScenarioTreeNode,
};
use good_lp::Expression;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const BUILD_GEN: &str = "BuildGen";
pub const DISPATCH_GEN: &str = "DispatchGen";
pub const INVESTMENT_COST: &str = "InvestmentCost";
pub const OPERATING_COST: &str = "OperatingCost";
pub const DISPATCH_WITHIN_CAPACITY: &str = "Dispatch_Within_Capacity";
pub const ZONE_ENERGY_BALANCE: &str = "Zone_Energy_Balance";
pub const ZONE_POWER_WITHDRAWALS: &str = "Zone_Power_Withdrawals";
pub const SPINNING_RESERVE_UP_PROVISIONS: &str = "Spinning_Reserve_Up_Provisions";
pub const ROOT_NODE: &str = "RootNode";

/// Options controlling which optional modules are added to each instance.
#[derive(Debug, Clone, Default)]
pub struct ExpansionOptions {
    /// Add the simple demand response components
    pub demand_response: bool,
    pub demand_response_options: DemandResponseOptions,
    /// Per-period rows from `demand_response_max_share.tab`
    pub demand_response_shares: BTreeMap<String, f64>,
}

/// Build the model instance for one scenario.
pub fn build_instance(
    data: &ModelData,
    scenario: &ScenarioSpec,
    options: &ExpansionOptions,
) -> CapexResult<ModelInstance> {
    build_instance_with_summary(data, scenario, options).map(|(model, _)| model)
}

/// As [`build_instance`], also returning what demand response added (if enabled).
pub fn build_instance_with_summary(
    data: &ModelData,
    scenario: &ScenarioSpec,
    options: &ExpansionOptions,
) -> CapexResult<(ModelInstance, Option<DemandResponseSummary>)> {
    let data = data.with_load_scale(scenario.load_scale);
    let mut model = ModelInstance::new(scenario.scenario_id.clone());
    let timepoints = data.timepoints();
    let tp_period = data.tp_period();
    let tp_hours = data.tp_hours();

    // === Stage 1: investment ===
    model.declare_var(BUILD_GEN, 1)?;
    let mut investment = Expression::from(0.0);
    for project in &data.projects {
        let annualized = project.capital_cost_per_mw
            * capital_recovery_factor(data.discount_rate, project.lifetime_years);
        for period in &data.periods {
            let bounds = match project.max_capacity_mw {
                Some(max) => Bounds::non_negative().with_upper(max),
                None => Bounds::non_negative(),
            };
            let build = model.add_var(
                BUILD_GEN,
                index_key(&[project.name.as_str(), period.as_str()]),
                bounds,
            )?;
            investment += annualized * build;
        }
    }
    model.add_expression(INVESTMENT_COST, vec![], investment)?;

    // === Stage 2: operations ===
    model.declare_var(DISPATCH_GEN, 2)?;
    let mut operating = Expression::from(0.0);
    for project in &data.projects {
        for &tp in &timepoints {
            let dispatch = model.add_var(
                DISPATCH_GEN,
                index_key(&[project.name.as_str(), tp]),
                Bounds::non_negative(),
            )?;
            operating += (project.variable_cost_per_mwh * tp_hours[tp]) * dispatch;

            // capacity built in this or any earlier period
            let mut capacity = Expression::from(0.0);
            for period in &data.periods {
                if let Some(build) = model.var(BUILD_GEN, &[project.name.as_str(), period.as_str()])
                {
                    capacity += build.variable;
                }
                if period.as_str() == tp_period[tp] {
                    break;
                }
            }
            model.add_constraint(
                DISPATCH_WITHIN_CAPACITY,
                index_key(&[project.name.as_str(), tp]),
                Expression::from(dispatch) - capacity,
                ConstraintSense::Leq,
                0.0,
            )?;
        }
    }
    model.add_expression(OPERATING_COST, vec![], operating)?;

    model.create_registry(ZONE_POWER_WITHDRAWALS);
    if data.spinning_reserves {
        model.create_registry(SPINNING_RESERVE_UP_PROVISIONS);
    }

    let dr_summary = if options.demand_response {
        Some(demand_response::define_components(
            &mut model,
            &data,
            &options.demand_response_options,
            &options.demand_response_shares,
        )?)
    } else {
        None
    };

    // The balance sums the withdrawals registry, so it is built last.
    let demand = data.demand_table();
    for zone in &data.load_zones {
        for &tp in &timepoints {
            let mut net = Expression::from(0.0);
            for project in data.projects.iter().filter(|p| &p.zone == zone) {
                if let Some(dispatch) = model.var(DISPATCH_GEN, &[project.name.as_str(), tp]) {
                    net += dispatch.variable;
                }
            }
            let withdrawals = model.registry_sum(ZONE_POWER_WITHDRAWALS, &[zone.as_str(), tp])?;
            let load = demand.get(&(zone.as_str(), tp)).copied().unwrap_or(0.0);
            model.add_constraint(
                ZONE_ENERGY_BALANCE,
                index_key(&[zone.as_str(), tp]),
                net - withdrawals,
                ConstraintSense::Eq,
                load,
            )?;
        }
    }

    debug!(
        scenario = %scenario.scenario_id,
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        demand_response = options.demand_response,
        "built expansion instance"
    );
    Ok((model, dr_summary))
}

/// Name of the stage-2 tree node for a scenario.
pub fn leaf_node_name(scenario_id: &str) -> String {
    format!("{}Node", scenario_id)
}

/// Build every scenario instance and arrange them in a two-stage tree.
///
/// `RootNode` owns the first-stage variable ids, which agree across
/// scenarios because every instance declares variables in the same order.
/// Each scenario's leaf owns its second-stage ids; its node list is
/// `[RootNode, <leaf>]`.
pub fn build_scenario_tree(data: &ModelData, options: &ExpansionOptions) -> CapexResult<ScenarioTree> {
    let scenarios = data.resolve_scenarios()?;

    let mut tree = ScenarioTree::new();
    tree.add_node(ScenarioTreeNode::new(ROOT_NODE, 1))?;

    for spec in &scenarios {
        let instance = build_instance(data, spec, options)?;
        let leaf = leaf_node_name(&spec.scenario_id);

        tree.node_mut(ROOT_NODE)
            .ok_or_else(|| CapexError::Validation(format!("missing {}", ROOT_NODE)))?
            .add_variable_ids(instance.variable_ids_for_stage(1));
        tree.add_node(
            ScenarioTreeNode::new(leaf.clone(), 2)
                .with_parent(ROOT_NODE, spec.probability)
                .with_variable_ids(instance.variable_ids_for_stage(2)),
        )?;
        tree.add_scenario(Scenario::new(
            spec.scenario_id.clone(),
            spec.probability,
            vec![ROOT_NODE.to_string(), leaf],
            instance,
        ))?;
    }

    tree.validate()?;
    info!(
        scenarios = tree.scenarios().len(),
        nodes = tree.nodes().len(),
        "built two-stage scenario tree"
    );
    Ok(tree)
}
