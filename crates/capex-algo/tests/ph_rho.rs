//! CP rho setting over a built two-stage expansion tree

use capex_algo::expansion::{build_scenario_tree, ExpansionOptions, BUILD_GEN, ROOT_NODE};
use capex_algo::ph::{
    apply_to_all_scenarios, CostProportionalRho, RhoSetter, RhoSetterCallback, RhoTable,
};
use capex_core::{
    capital_recovery_factor, ModelData, Scenario, ScenarioTree, ScenarioTreeNode, VariableId,
};

const MODEL: &str = r#"
name: three_zone
discount_rate: 0.05
load_zones: [North, Central, South]
periods: ["2030", "2040"]
timeseries:
  - { id: d30, period: "2030", hours_per_timepoint: 12, timepoints: [a00, a12] }
  - { id: d40, period: "2040", hours_per_timepoint: 12, timepoints: [b00, b12] }
zone_demand:
  - { zone: North, timepoint: a00, demand_mw: 120 }
  - { zone: Central, timepoint: a12, demand_mw: 80 }
  - { zone: South, timepoint: b00, demand_mw: 60 }
projects:
  - { name: north_gas, zone: North, capital_cost_per_mw: 900000, lifetime_years: 30, variable_cost_per_mwh: 45 }
  - { name: central_wind, zone: Central, capital_cost_per_mw: 1500000, lifetime_years: 25 }
  - { name: south_solar, zone: South, capital_cost_per_mw: 1100000, lifetime_years: 20 }
scenarios:
  - { scenario_id: Low, probability: 0.3, load_scale: 0.9 }
  - { scenario_id: Base, probability: 0.4 }
  - { scenario_id: High, probability: 0.3, load_scale: 1.15 }
"#;

fn model_data() -> ModelData {
    let data: ModelData = serde_yaml::from_str(MODEL).unwrap();
    data.validate().unwrap();
    data
}

/// Records every call so ordering and multiplicity can be checked.
#[derive(Default)]
struct Recorder {
    calls: Vec<(String, String, VariableId, f64)>,
}

impl RhoSetter for Recorder {
    fn set_rho_one_scenario(
        &mut self,
        node: &ScenarioTreeNode,
        scenario: &Scenario,
        variable_id: &VariableId,
        value: f64,
    ) {
        self.calls
            .push((node.name.clone(), scenario.name.clone(), *variable_id, value));
    }
}

#[test]
fn test_rho_set_only_for_first_stage_at_root() {
    let data = model_data();
    let tree = build_scenario_tree(&data, &ExpansionOptions::default()).unwrap();

    let mut rhos = RhoTable::new();
    let reports = apply_to_all_scenarios(&CostProportionalRho::default(), &mut rhos, &tree)
        .unwrap();

    // 3 projects x 2 periods in each of 3 scenarios
    assert_eq!(reports.len(), 3);
    assert_eq!(rhos.len(), 18);
    for report in &reports {
        assert_eq!(report.assigned, 6);
        assert!(report.unassigned.is_empty());
        assert!(report.diagnostics.is_empty());
    }
    assert!(rhos.entries().iter().all(|e| e.node == ROOT_NODE));

    let low = tree.scenario("Low").unwrap();
    let wind = low.instance().var(BUILD_GEN, &["central_wind", "2040"]).unwrap();
    let expected = 1_500_000.0 * capital_recovery_factor(0.05, 25);
    for scenario in ["Low", "Base", "High"] {
        let rho = rhos.get(ROOT_NODE, scenario, wind.id).unwrap();
        assert!((rho - expected).abs() < 1e-6 * expected);
    }
}

#[test]
fn test_rho_coefficient_scales_values() {
    let data = model_data();
    let tree = build_scenario_tree(&data, &ExpansionOptions::default()).unwrap();
    let base = tree.scenario("Base").unwrap();

    let mut unit = Recorder::default();
    CostProportionalRho::default()
        .set_rhos(&mut unit, &tree, base)
        .unwrap();
    let mut half = Recorder::default();
    CostProportionalRho::new("InvestmentCost", 0.5)
        .set_rhos(&mut half, &tree, base)
        .unwrap();

    assert_eq!(unit.calls.len(), half.calls.len());
    for (a, b) in unit.calls.iter().zip(&half.calls) {
        assert_eq!(a.2, b.2);
        assert!((a.3 * 0.5 - b.3).abs() < 1e-9 * a.3);
    }
    // ascending variable id order
    assert!(unit.calls.windows(2).all(|w| w[0].2 < w[1].2));
}

#[test]
fn test_demand_response_variables_never_get_rho() {
    let data = model_data();
    let options = ExpansionOptions {
        demand_response: true,
        ..Default::default()
    };
    let tree = build_scenario_tree(&data, &options).unwrap();

    let mut rhos = RhoTable::new();
    apply_to_all_scenarios(&CostProportionalRho::default(), &mut rhos, &tree).unwrap();

    let high = tree.scenario("High").unwrap();
    let shift = high.instance().var("ShiftDemand", &["North", "a00"]).unwrap();
    assert!(rhos.get("HighNode", "High", shift.id).is_none());
    assert_eq!(rhos.len(), 18);
}

#[test]
fn test_unowned_first_stage_variables_are_reported() {
    let data = model_data();
    let built = build_scenario_tree(&data, &ExpansionOptions::default()).unwrap();

    // Same instances, but the root owns nothing.
    let mut tree = ScenarioTree::new();
    tree.add_node(ScenarioTreeNode::new(ROOT_NODE, 1)).unwrap();
    let spec = &data.resolve_scenarios().unwrap()[1];
    let instance = capex_algo::build_instance(&data, spec, &ExpansionOptions::default()).unwrap();
    tree.add_scenario(Scenario::new(
        "Base",
        1.0,
        vec![ROOT_NODE.to_string()],
        instance,
    ))
    .unwrap();

    let mut rhos = RhoTable::new();
    let report = CostProportionalRho::default()
        .set_rhos(&mut rhos, &tree, tree.scenario("Base").unwrap())
        .unwrap();

    assert!(rhos.is_empty());
    assert_eq!(report.assigned, 0);
    assert_eq!(report.unassigned.len(), 6);
    assert_eq!(report.diagnostics.warning_count(), 6);
    assert!(report
        .unassigned
        .iter()
        .any(|(_, name)| name == "BuildGen[south_solar,2030]"));
    // ids agree with the tree built the normal way
    let root_ids = built.node(ROOT_NODE).unwrap().standard_variable_ids();
    assert!(report.unassigned.iter().all(|(id, _)| root_ids.contains(id)));
}

#[test]
fn test_unknown_node_in_scenario_path_is_fatal() {
    let data = model_data();
    let built = build_scenario_tree(&data, &ExpansionOptions::default()).unwrap();
    let scenario = built.scenario("Low").unwrap();

    // a tree without the scenario's leaf node
    let mut other = ScenarioTree::new();
    other.add_node(ScenarioTreeNode::new(ROOT_NODE, 1)).unwrap();

    let err = CostProportionalRho::default()
        .set_rhos(&mut RhoTable::new(), &other, scenario)
        .unwrap_err();
    assert!(err.to_string().contains("LowNode"));
}
