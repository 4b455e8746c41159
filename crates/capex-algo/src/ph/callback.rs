//! CP(rho) rho-setter callback for progressive hedging.
//!
//! Sets rho only for the variables that appear in the first-stage cost
//! expression. In a two-stage expansion problem these are the investment
//! variables owned by the root node; setting rho for every variable would
//! mean scanning the full objective and the whole tree for each of them,
//! which dominates start-up time on large systems.

use super::{assign_rho, extract_cost_coefficients, RhoError};
use capex_core::{
    CapexResult, Diagnostics, Scenario, ScenarioTree, ScenarioTreeNode, VariableId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Name of the first-stage cost expression in the reference model.
pub const DEFAULT_COST_EXPRESSION: &str = "InvestmentCost";

/// CP(1.0) is a good trade-off between convergence to the extensive-form
/// optimum and number of PH iterations (Watson & Woodruff, 2011).
pub const DEFAULT_RHO_COEFFICIENT: f64 = 1.0;

/// PH-side interface receiving per-scenario rho values.
pub trait RhoSetter {
    fn set_rho_one_scenario(
        &mut self,
        node: &ScenarioTreeNode,
        scenario: &Scenario,
        variable_id: &VariableId,
        value: f64,
    );
}

/// A callback invoked once per scenario to set rho values.
pub trait RhoSetterCallback {
    fn set_rhos(
        &self,
        ph: &mut dyn RhoSetter,
        tree: &ScenarioTree,
        scenario: &Scenario,
    ) -> CapexResult<RhoReport>;
}

/// Rho values set by a callback, keyed by (node, scenario, variable).
#[derive(Debug, Clone, Default, Serialize)]
pub struct RhoTable {
    entries: BTreeMap<(String, String, VariableId), f64>,
}

/// Flat view of one [`RhoTable`] entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RhoEntry {
    pub node: String,
    pub scenario: String,
    pub variable_id: VariableId,
    pub rho: f64,
}

impl RhoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &str, scenario: &str, variable_id: VariableId) -> Option<f64> {
        self.entries
            .get(&(node.to_string(), scenario.to_string(), variable_id))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<RhoEntry> {
        self.entries
            .iter()
            .map(|((node, scenario, variable_id), rho)| RhoEntry {
                node: node.clone(),
                scenario: scenario.clone(),
                variable_id: *variable_id,
                rho: *rho,
            })
            .collect()
    }
}

impl RhoSetter for RhoTable {
    fn set_rho_one_scenario(
        &mut self,
        node: &ScenarioTreeNode,
        scenario: &Scenario,
        variable_id: &VariableId,
        value: f64,
    ) {
        self.entries
            .insert((node.name.clone(), scenario.name.clone(), *variable_id), value);
    }
}

/// Outcome of running the callback for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct RhoReport {
    pub scenario: String,
    pub assigned: usize,
    /// Variables in the cost expression no tree node owns
    pub unassigned: Vec<(VariableId, String)>,
    pub diagnostics: Diagnostics,
}

/// Cost-proportional rho for first-stage variables.
#[derive(Debug, Clone)]
pub struct CostProportionalRho {
    /// Name of the first-stage cost expression in each scenario instance
    pub cost_expression: String,
    /// Multiplier applied to each cost coefficient
    pub rho_coefficient: f64,
}

impl Default for CostProportionalRho {
    fn default() -> Self {
        Self {
            cost_expression: DEFAULT_COST_EXPRESSION.to_string(),
            rho_coefficient: DEFAULT_RHO_COEFFICIENT,
        }
    }
}

impl CostProportionalRho {
    pub fn new(cost_expression: impl Into<String>, rho_coefficient: f64) -> Self {
        Self {
            cost_expression: cost_expression.into(),
            rho_coefficient,
        }
    }
}

impl RhoSetterCallback for CostProportionalRho {
    fn set_rhos(
        &self,
        ph: &mut dyn RhoSetter,
        tree: &ScenarioTree,
        scenario: &Scenario,
    ) -> CapexResult<RhoReport> {
        let instance = scenario.instance();
        let cost = instance.find_expression(&self.cost_expression).ok_or_else(|| {
            RhoError::MissingCostExpression {
                expression: self.cost_expression.clone(),
                instance: instance.name().to_string(),
            }
        })?;

        let (coefficients, names) = extract_cost_coefficients(cost, instance.symbol_map())?;

        let nodes = scenario
            .node_list()
            .iter()
            .map(|name| {
                tree.node(name).ok_or_else(|| RhoError::UnknownTreeNode {
                    scenario: scenario.name.clone(),
                    node: name.clone(),
                })
            })
            .collect::<Result<Vec<&ScenarioTreeNode>, RhoError>>()?;

        let mut assigned = 0;
        let unassigned_ids = assign_rho(
            &coefficients,
            &names,
            &nodes,
            |node: &&ScenarioTreeNode, id: &VariableId, value: f64| {
                ph.set_rho_one_scenario(node, scenario, id, value);
                assigned += 1;
            },
            self.rho_coefficient,
        )?;

        let mut diagnostics = Diagnostics::new();
        let mut unassigned = Vec::with_capacity(unassigned_ids.len());
        for id in unassigned_ids {
            let name = names.get(&id).cloned().unwrap_or_else(|| id.to_string());
            warn!(
                scenario = %scenario.name,
                "could not find tree node for variable {}; rho not set", name
            );
            diagnostics.add_warning_with_entity(
                "rho",
                "no tree node owns this variable; rho not set",
                &name,
            );
            unassigned.push((id, name));
        }

        debug!(
            scenario = %scenario.name,
            assigned,
            unassigned = unassigned.len(),
            "cost-proportional rho set"
        );

        Ok(RhoReport {
            scenario: scenario.name.clone(),
            assigned,
            unassigned,
            diagnostics,
        })
    }
}

/// Run `callback` for every scenario of `tree`, in tree order.
pub fn apply_to_all_scenarios(
    callback: &dyn RhoSetterCallback,
    ph: &mut dyn RhoSetter,
    tree: &ScenarioTree,
) -> CapexResult<Vec<RhoReport>> {
    tree.scenarios()
        .iter()
        .map(|scenario| callback.set_rhos(ph, tree, scenario))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capex_core::{index_key, Bounds, ModelInstance};

    /// Root owns Build[a] only; Build[b] appears in the cost but is owned
    /// by nobody.
    fn tree_with_orphan() -> ScenarioTree {
        let mut model = ModelInstance::new("only");
        model.declare_var("Build", 1).unwrap();
        let a = model
            .add_var("Build", index_key(&["a"]), Bounds::non_negative())
            .unwrap();
        let b = model
            .add_var("Build", index_key(&["b"]), Bounds::non_negative())
            .unwrap();
        model
            .add_expression("InvestmentCost", vec![], 5.0 * a + 7.0 * b)
            .unwrap();
        let id_a = model.var("Build", &["a"]).unwrap().id;

        let mut tree = ScenarioTree::new();
        tree.add_node(ScenarioTreeNode::new("RootNode", 1).with_variable_ids([id_a]))
            .unwrap();
        tree.add_scenario(Scenario::new("only", 1.0, vec!["RootNode".into()], model))
            .unwrap();
        tree
    }

    #[test]
    fn test_sets_owned_and_warns_unowned() {
        let tree = tree_with_orphan();
        let scenario = tree.scenario("only").unwrap();
        let mut table = RhoTable::new();

        let report = CostProportionalRho::new("InvestmentCost", 2.0)
            .set_rhos(&mut table, &tree, scenario)
            .unwrap();

        assert_eq!(report.assigned, 1);
        assert_eq!(table.get("RootNode", "only", VariableId::new(0)), Some(10.0));
        assert_eq!(report.unassigned, vec![(VariableId::new(1), "Build[b]".to_string())]);
        assert_eq!(report.diagnostics.warning_count(), 1);
        assert_eq!(
            report.diagnostics.issues[0].entity.as_deref(),
            Some("Build[b]")
        );
    }

    #[test]
    fn test_report_serializes_unassigned_names() {
        let tree = tree_with_orphan();
        let report = CostProportionalRho::default()
            .set_rhos(&mut RhoTable::new(), &tree, tree.scenario("only").unwrap())
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["unassigned"][0][1], "Build[b]");
        assert_eq!(json["diagnostics"]["issues"][0]["severity"], "warning");
    }

    #[test]
    fn test_missing_cost_expression_is_fatal() {
        let tree = tree_with_orphan();
        let scenario = tree.scenario("only").unwrap();
        let mut table = RhoTable::new();

        let err = CostProportionalRho::new("FirstStageCost", 1.0)
            .set_rhos(&mut table, &tree, scenario)
            .unwrap_err();
        assert!(err.to_string().contains("FirstStageCost"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_entries_flatten_table() {
        let tree = tree_with_orphan();
        let mut table = RhoTable::new();
        let reports =
            apply_to_all_scenarios(&CostProportionalRho::default(), &mut table, &tree).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            table.entries(),
            vec![RhoEntry {
                node: "RootNode".into(),
                scenario: "only".into(),
                variable_id: VariableId::new(0),
                rho: 5.0,
            }]
        );
    }
}
