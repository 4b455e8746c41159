//! Scenario tree for two-stage (and deeper) stochastic programs.
//!
//! Each [`ScenarioTreeNode`] owns the ids of the variables decided at that
//! node ("standard variable ids"). A [`Scenario`] is a root-to-leaf path
//! through the tree plus the model instance built for that scenario.
//!
//! ```text
//!              RootNode (stage 1: BuildGen[*])
//!             /         |         \
//!        LowNode     BaseNode    HighNode   (stage 2: DispatchGen[*], ShiftDemand[*])
//!           |           |           |
//!          Low         Base        High     scenarios
//! ```

use crate::error::{CapexError, CapexResult};
use crate::model::ModelInstance;
use crate::symbol_map::VariableId;
use std::collections::{HashMap, HashSet};

/// Membership test used when searching nodes for a variable's owner.
pub trait VariableMembership {
    fn contains_variable(&self, id: &VariableId) -> bool;
}

#[derive(Debug, Clone)]
pub struct ScenarioTreeNode {
    pub name: String,
    /// 1-based stage of the decisions owned by this node
    pub stage: usize,
    pub parent: Option<String>,
    pub conditional_probability: f64,
    standard_variable_ids: HashSet<VariableId>,
}

impl ScenarioTreeNode {
    pub fn new(name: impl Into<String>, stage: usize) -> Self {
        Self {
            name: name.into(),
            stage,
            parent: None,
            conditional_probability: 1.0,
            standard_variable_ids: HashSet::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>, conditional_probability: f64) -> Self {
        self.parent = Some(parent.into());
        self.conditional_probability = conditional_probability;
        self
    }

    pub fn with_variable_ids(mut self, ids: impl IntoIterator<Item = VariableId>) -> Self {
        self.standard_variable_ids.extend(ids);
        self
    }

    pub fn add_variable_ids(&mut self, ids: impl IntoIterator<Item = VariableId>) {
        self.standard_variable_ids.extend(ids);
    }

    pub fn standard_variable_ids(&self) -> &HashSet<VariableId> {
        &self.standard_variable_ids
    }
}

impl VariableMembership for ScenarioTreeNode {
    fn contains_variable(&self, id: &VariableId) -> bool {
        self.standard_variable_ids.contains(id)
    }
}

impl<N: VariableMembership + ?Sized> VariableMembership for &N {
    fn contains_variable(&self, id: &VariableId) -> bool {
        (**self).contains_variable(id)
    }
}

/// One scenario: its probability, ordered node path and model instance.
#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub probability: f64,
    node_list: Vec<String>,
    instance: ModelInstance,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        probability: f64,
        node_list: Vec<String>,
        instance: ModelInstance,
    ) -> Self {
        Self {
            name: name.into(),
            probability,
            node_list,
            instance,
        }
    }

    /// Node names from root to leaf.
    pub fn node_list(&self) -> &[String] {
        &self.node_list
    }

    pub fn instance(&self) -> &ModelInstance {
        &self.instance
    }

    pub fn leaf(&self) -> Option<&str> {
        self.node_list.last().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct ScenarioTree {
    nodes: Vec<ScenarioTreeNode>,
    node_index: HashMap<String, usize>,
    scenarios: Vec<Scenario>,
}

impl ScenarioTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. The parent (if any) must already exist.
    pub fn add_node(&mut self, node: ScenarioTreeNode) -> CapexResult<()> {
        if self.node_index.contains_key(&node.name) {
            return Err(CapexError::Validation(format!(
                "duplicate scenario tree node '{}'",
                node.name
            )));
        }
        if let Some(parent) = &node.parent {
            let parent_node = self.node(parent).ok_or_else(|| {
                CapexError::Validation(format!(
                    "node '{}' refers to unknown parent '{}'",
                    node.name, parent
                ))
            })?;
            if parent_node.stage >= node.stage {
                return Err(CapexError::Validation(format!(
                    "node '{}' (stage {}) must come after its parent '{}' (stage {})",
                    node.name, node.stage, parent, parent_node.stage
                )));
            }
        }
        self.node_index.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Add a scenario; every node on its path must already exist.
    pub fn add_scenario(&mut self, scenario: Scenario) -> CapexResult<()> {
        if self.scenario(&scenario.name).is_some() {
            return Err(CapexError::Validation(format!(
                "duplicate scenario '{}'",
                scenario.name
            )));
        }
        if scenario.node_list.is_empty() {
            return Err(CapexError::Validation(format!(
                "scenario '{}' has an empty node list",
                scenario.name
            )));
        }
        for name in &scenario.node_list {
            if !self.node_index.contains_key(name) {
                return Err(CapexError::Validation(format!(
                    "scenario '{}' refers to unknown node '{}'",
                    scenario.name, name
                )));
            }
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    pub fn node(&self, name: &str) -> Option<&ScenarioTreeNode> {
        self.node_index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut ScenarioTreeNode> {
        let i = *self.node_index.get(name)?;
        self.nodes.get_mut(i)
    }

    pub fn nodes(&self) -> &[ScenarioTreeNode] {
        &self.nodes
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Check that scenario probabilities sum to one.
    pub fn validate(&self) -> CapexResult<()> {
        if self.scenarios.is_empty() {
            return Err(CapexError::Validation("scenario tree has no scenarios".into()));
        }
        let total: f64 = self.scenarios.iter().map(|s| s.probability).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(CapexError::Validation(format!(
                "scenario probabilities sum to {}, expected 1",
                total
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stage_tree() -> ScenarioTree {
        let mut tree = ScenarioTree::new();
        tree.add_node(ScenarioTreeNode::new("RootNode", 1).with_variable_ids([VariableId::new(0)]))
            .unwrap();
        tree.add_node(
            ScenarioTreeNode::new("LowNode", 2)
                .with_parent("RootNode", 0.5)
                .with_variable_ids([VariableId::new(1)]),
        )
        .unwrap();
        tree.add_node(ScenarioTreeNode::new("HighNode", 2).with_parent("RootNode", 0.5))
            .unwrap();
        tree
    }

    #[test]
    fn test_membership() {
        let tree = two_stage_tree();
        let root = tree.node("RootNode").unwrap();
        assert!(root.contains_variable(&VariableId::new(0)));
        assert!(!root.contains_variable(&VariableId::new(1)));
    }

    #[test]
    fn test_unknown_parent_and_stage_order() {
        let mut tree = two_stage_tree();
        let orphan = ScenarioTreeNode::new("Orphan", 2).with_parent("Nowhere", 1.0);
        assert!(tree.add_node(orphan).is_err());

        let backwards = ScenarioTreeNode::new("Back", 1).with_parent("LowNode", 1.0);
        assert!(tree.add_node(backwards).is_err());

        assert!(tree.add_node(ScenarioTreeNode::new("RootNode", 1)).is_err());
    }

    #[test]
    fn test_scenarios_validated() {
        let mut tree = two_stage_tree();
        let low = Scenario::new(
            "Low",
            0.5,
            vec!["RootNode".into(), "LowNode".into()],
            ModelInstance::new("Low"),
        );
        tree.add_scenario(low).unwrap();
        assert!(tree.validate().is_err());

        let bad = Scenario::new(
            "Bad",
            0.5,
            vec!["RootNode".into(), "MissingNode".into()],
            ModelInstance::new("Bad"),
        );
        assert!(tree.add_scenario(bad).is_err());

        let high = Scenario::new(
            "High",
            0.5,
            vec!["RootNode".into(), "HighNode".into()],
            ModelInstance::new("High"),
        );
        tree.add_scenario(high).unwrap();
        assert!(tree.validate().is_ok());
        assert_eq!(tree.scenario("High").unwrap().leaf(), Some("HighNode"));
    }
}
