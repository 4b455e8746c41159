//! Model instances: named, indexed components over `good_lp`.
//!
//! `good_lp` gives us variables, affine expressions and constraints but no
//! notion of a named component. [`ModelInstance`] adds that layer:
//!
//! - indexed variable components (`BuildGen[solar,2030]`) with bounds and a
//!   decision stage, each registered in the instance's [`SymbolMap`];
//! - indexed expressions (`InvestmentCost`, `HIDemandResponseSimpleSpinningReserveUp[ba,t]`);
//! - indexed linear constraints (`Demand_Response_Net_Zero[zone,ts]`);
//! - registries: ordered lists of component names that other modules append
//!   to (`Zone_Power_Withdrawals`), so the energy balance can sum every
//!   registered withdrawal without knowing who contributed it.
//!
//! Index keys are ordered string tuples; the empty key denotes a scalar
//! component.

use crate::error::{CapexError, CapexResult};
use crate::symbol_map::{SymbolMap, VariableId};
use good_lp::{constraint, variable, Expression, ProblemVariables, Variable};
use std::collections::{BTreeMap, HashSet};

/// Index of one entry in an indexed component.
pub type IndexKey = Vec<String>;

/// Build an [`IndexKey`] from string slices.
pub fn index_key(parts: &[&str]) -> IndexKey {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Render `Component[i,j]` (or just `Component` for scalars).
pub fn full_name(component: &str, index: &[String]) -> String {
    if index.is_empty() {
        component.to_string()
    } else {
        format!("{}[{}]", component, index.join(","))
    }
}

/// Optional lower/upper bounds of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn non_negative() -> Self {
        Self {
            lower: Some(0.0),
            upper: None,
        }
    }

    pub fn lower(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }
}

/// One declared decision variable.
#[derive(Debug, Clone)]
pub struct ModelVar {
    pub variable: Variable,
    pub id: VariableId,
    pub name: String,
    pub bounds: Bounds,
}

/// An indexed family of variables sharing a name and a decision stage.
#[derive(Debug, Clone)]
pub struct VarComponent {
    pub name: String,
    /// Decision stage (1 = first stage, decided before uncertainty resolves)
    pub stage: usize,
    entries: BTreeMap<IndexKey, ModelVar>,
}

impl VarComponent {
    pub fn get(&self, index: &[&str]) -> Option<&ModelVar> {
        self.entries.get(&index_key(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &ModelVar)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Comparison sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Eq,
    Leq,
    Geq,
}

/// `lhs <sense> rhs`, kept inspectable until handed to a solver.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub name: String,
    pub lhs: Expression,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn to_constraint(&self) -> good_lp::Constraint {
        let lhs = self.lhs.clone();
        let rhs = self.rhs;
        match self.sense {
            ConstraintSense::Eq => constraint!(lhs == rhs),
            ConstraintSense::Leq => constraint!(lhs <= rhs),
            ConstraintSense::Geq => constraint!(lhs >= rhs),
        }
    }
}

/// A built model: variables, expressions, constraints and registries.
pub struct ModelInstance {
    name: String,
    variables: ProblemVariables,
    symbols: SymbolMap,
    var_components: BTreeMap<String, VarComponent>,
    expressions: BTreeMap<String, BTreeMap<IndexKey, Expression>>,
    constraints: BTreeMap<String, BTreeMap<IndexKey, LinearConstraint>>,
    registries: BTreeMap<String, Vec<String>>,
}

impl std::fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInstance")
            .field("name", &self.name)
            .field("variables", &self.symbols.len())
            .field("var_components", &self.var_components.keys().collect::<Vec<_>>())
            .field("expressions", &self.expressions.keys().collect::<Vec<_>>())
            .field("constraints", &self.constraints.keys().collect::<Vec<_>>())
            .field("registries", &self.registries)
            .finish()
    }
}

impl ModelInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: ProblemVariables::new(),
            symbols: SymbolMap::new(),
            var_components: BTreeMap::new(),
            expressions: BTreeMap::new(),
            constraints: BTreeMap::new(),
            registries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol_map(&self) -> &SymbolMap {
        &self.symbols
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Declare an (initially empty) variable component.
    ///
    /// Declaring an existing component with a different stage is an error.
    pub fn declare_var(&mut self, component: &str, stage: usize) -> CapexResult<()> {
        match self.var_components.get(component) {
            Some(existing) if existing.stage != stage => Err(CapexError::Model(format!(
                "variable component '{}' already declared for stage {}",
                component, existing.stage
            ))),
            Some(_) => Ok(()),
            None => {
                self.var_components.insert(
                    component.to_string(),
                    VarComponent {
                        name: component.to_string(),
                        stage,
                        entries: BTreeMap::new(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Add one indexed variable to a declared component.
    pub fn add_var(
        &mut self,
        component: &str,
        index: IndexKey,
        bounds: Bounds,
    ) -> CapexResult<Variable> {
        let comp = self.var_components.get_mut(component).ok_or_else(|| {
            CapexError::Model(format!("variable component '{}' not declared", component))
        })?;
        if comp.entries.contains_key(&index) {
            return Err(CapexError::Model(format!(
                "duplicate variable {}",
                full_name(component, &index)
            )));
        }
        if let (Some(lo), Some(hi)) = (bounds.lower, bounds.upper) {
            if lo > hi {
                return Err(CapexError::Model(format!(
                    "variable {} has lower bound {} above upper bound {}",
                    full_name(component, &index),
                    lo,
                    hi
                )));
            }
        }

        let name = full_name(component, &index);
        let mut def = variable().name(name.clone());
        if let Some(lo) = bounds.lower {
            def = def.min(lo);
        }
        if let Some(hi) = bounds.upper {
            def = def.max(hi);
        }
        let var = self.variables.add(def);
        let id = self.symbols.register(var, name.clone());
        comp.entries.insert(
            index,
            ModelVar {
                variable: var,
                id,
                name,
                bounds,
            },
        );
        Ok(var)
    }

    pub fn var_component(&self, component: &str) -> Option<&VarComponent> {
        self.var_components.get(component)
    }

    pub fn var(&self, component: &str, index: &[&str]) -> Option<&ModelVar> {
        self.var_components.get(component)?.get(index)
    }

    pub fn var_components(&self) -> impl Iterator<Item = &VarComponent> {
        self.var_components.values()
    }

    /// Ids of every variable declared for `stage`.
    pub fn variable_ids_for_stage(&self, stage: usize) -> HashSet<VariableId> {
        self.var_components
            .values()
            .filter(|c| c.stage == stage)
            .flat_map(|c| c.entries.values().map(|v| v.id))
            .collect()
    }

    pub fn num_variables(&self) -> usize {
        self.symbols.len()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn add_expression(
        &mut self,
        component: &str,
        index: IndexKey,
        expr: Expression,
    ) -> CapexResult<()> {
        let entries = self.expressions.entry(component.to_string()).or_default();
        if entries.contains_key(&index) {
            return Err(CapexError::Model(format!(
                "duplicate expression {}",
                full_name(component, &index)
            )));
        }
        entries.insert(index, expr);
        Ok(())
    }

    pub fn expression(&self, component: &str, index: &[&str]) -> Option<&Expression> {
        self.expressions.get(component)?.get(&index_key(index))
    }

    /// Look up a scalar expression by component name.
    pub fn find_expression(&self, component: &str) -> Option<&Expression> {
        self.expression(component, &[])
    }

    pub fn expression_component(
        &self,
        component: &str,
    ) -> Option<&BTreeMap<IndexKey, Expression>> {
        self.expressions.get(component)
    }

    pub fn has_component(&self, component: &str) -> bool {
        self.var_components.contains_key(component)
            || self.expressions.contains_key(component)
            || self.constraints.contains_key(component)
    }

    // =========================================================================
    // Constraints
    // =========================================================================

    pub fn add_constraint(
        &mut self,
        component: &str,
        index: IndexKey,
        lhs: Expression,
        sense: ConstraintSense,
        rhs: f64,
    ) -> CapexResult<()> {
        let name = full_name(component, &index);
        let entries = self.constraints.entry(component.to_string()).or_default();
        if entries.contains_key(&index) {
            return Err(CapexError::Model(format!("duplicate constraint {}", name)));
        }
        entries.insert(
            index,
            LinearConstraint {
                name,
                lhs,
                sense,
                rhs,
            },
        );
        Ok(())
    }

    pub fn constraint(&self, component: &str, index: &[&str]) -> Option<&LinearConstraint> {
        self.constraints.get(component)?.get(&index_key(index))
    }

    pub fn constraint_component(
        &self,
        component: &str,
    ) -> Option<&BTreeMap<IndexKey, LinearConstraint>> {
        self.constraints.get(component)
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.values().map(BTreeMap::len).sum()
    }

    // =========================================================================
    // Registries
    // =========================================================================

    /// Create an empty registry; creating an existing registry is a no-op.
    pub fn create_registry(&mut self, registry: &str) {
        self.registries.entry(registry.to_string()).or_default();
    }

    pub fn has_registry(&self, registry: &str) -> bool {
        self.registries.contains_key(registry)
    }

    /// Append a component name to an existing registry.
    pub fn register(&mut self, registry: &str, component: &str) -> CapexResult<()> {
        let entries = self.registries.get_mut(registry).ok_or_else(|| {
            CapexError::Model(format!("registry '{}' does not exist", registry))
        })?;
        if !entries.iter().any(|c| c == component) {
            entries.push(component.to_string());
        }
        Ok(())
    }

    pub fn registry(&self, registry: &str) -> Option<&[String]> {
        self.registries.get(registry).map(Vec::as_slice)
    }

    /// Sum of the registered components at `index`.
    ///
    /// Each registered name may refer to a variable component or an
    /// expression component; missing entries at `index` contribute nothing.
    pub fn registry_sum(&self, registry: &str, index: &[&str]) -> CapexResult<Expression> {
        let components = self.registry(registry).ok_or_else(|| {
            CapexError::Model(format!("registry '{}' does not exist", registry))
        })?;
        let mut total = Expression::from(0.0);
        for component in components {
            if let Some(var) = self.var(component, index) {
                total += var.variable;
            } else if let Some(expr) = self.expression(component, index) {
                total += expr.clone();
            } else if !self.has_component(component) {
                return Err(CapexError::Model(format!(
                    "registry '{}' refers to unknown component '{}'",
                    registry, component
                )));
            }
        }
        Ok(total)
    }

    // =========================================================================
    // Solving
    // =========================================================================

    /// Consume the instance, returning its `good_lp` variables and every
    /// constraint, ready for `vars.minimise(objective).using(solver)`.
    pub fn into_parts(self) -> (ProblemVariables, Vec<good_lp::Constraint>) {
        let constraints = self
            .constraints
            .values()
            .flat_map(|entries| entries.values().map(LinearConstraint::to_constraint))
            .collect();
        (self.variables, constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::IntoAffineExpression;

    #[test]
    fn test_full_name_formatting() {
        assert_eq!(full_name("InvestmentCost", &[]), "InvestmentCost");
        assert_eq!(
            full_name("BuildGen", &index_key(&["solar", "2030"])),
            "BuildGen[solar,2030]"
        );
    }

    #[test]
    fn test_add_var_registers_symbol() {
        let mut m = ModelInstance::new("test");
        m.declare_var("BuildGen", 1).unwrap();
        m.add_var("BuildGen", index_key(&["solar", "2030"]), Bounds::non_negative())
            .unwrap();
        m.add_var("BuildGen", index_key(&["wind", "2030"]), Bounds::non_negative())
            .unwrap();

        let solar = m.var("BuildGen", &["solar", "2030"]).unwrap();
        assert_eq!(solar.id, VariableId::new(0));
        assert_eq!(solar.name, "BuildGen[solar,2030]");
        assert_eq!(m.symbol_map().id(solar.variable), Some(solar.id));
        assert_eq!(m.num_variables(), 2);
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let mut m = ModelInstance::new("test");
        m.declare_var("X", 1).unwrap();
        m.add_var("X", vec![], Bounds::free()).unwrap();
        let err = m.add_var("X", vec![], Bounds::free()).unwrap_err();
        assert!(err.to_string().contains("duplicate variable X"));
    }

    #[test]
    fn test_undeclared_component_and_stage_conflict() {
        let mut m = ModelInstance::new("test");
        assert!(m.add_var("X", vec![], Bounds::free()).is_err());
        m.declare_var("X", 1).unwrap();
        assert!(m.declare_var("X", 1).is_ok());
        assert!(m.declare_var("X", 2).is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut m = ModelInstance::new("test");
        m.declare_var("X", 1).unwrap();
        let bounds = Bounds::lower(5.0).with_upper(1.0);
        assert!(m.add_var("X", vec![], bounds).is_err());
    }

    #[test]
    fn test_stage_ids() {
        let mut m = ModelInstance::new("test");
        m.declare_var("Build", 1).unwrap();
        m.declare_var("Dispatch", 2).unwrap();
        m.add_var("Build", index_key(&["a"]), Bounds::non_negative()).unwrap();
        m.add_var("Dispatch", index_key(&["a", "t1"]), Bounds::non_negative())
            .unwrap();
        m.add_var("Dispatch", index_key(&["a", "t2"]), Bounds::non_negative())
            .unwrap();

        assert_eq!(m.variable_ids_for_stage(1).len(), 1);
        assert_eq!(m.variable_ids_for_stage(2).len(), 2);
        assert!(m.variable_ids_for_stage(3).is_empty());
    }

    #[test]
    fn test_registry_sum_mixes_vars_and_expressions() {
        let mut m = ModelInstance::new("test");
        m.create_registry("Zone_Power_Withdrawals");
        m.declare_var("Shift", 2).unwrap();
        let shift = m
            .add_var("Shift", index_key(&["z", "t"]), Bounds::free())
            .unwrap();
        m.add_expression("Extra", index_key(&["z", "t"]), 2.0 * shift)
            .unwrap();
        m.register("Zone_Power_Withdrawals", "Shift").unwrap();
        m.register("Zone_Power_Withdrawals", "Extra").unwrap();
        m.register("Zone_Power_Withdrawals", "Shift").unwrap();

        assert_eq!(m.registry("Zone_Power_Withdrawals").unwrap().len(), 2);
        let sum = m.registry_sum("Zone_Power_Withdrawals", &["z", "t"]).unwrap();
        let coeffs: Vec<(Variable, f64)> = (&sum).linear_coefficients().collect();
        assert_eq!(coeffs, vec![(shift, 3.0)]);
    }

    #[test]
    fn test_register_requires_registry() {
        let mut m = ModelInstance::new("test");
        assert!(m.register("Spinning_Reserve_Up_Provisions", "X").is_err());
        assert!(!m.has_registry("Spinning_Reserve_Up_Provisions"));
    }

    #[test]
    fn test_registry_unknown_component() {
        let mut m = ModelInstance::new("test");
        m.create_registry("R");
        m.register("R", "Ghost").unwrap();
        assert!(m.registry_sum("R", &[]).is_err());
    }

    #[test]
    fn test_constraints_counted_and_converted() {
        let mut m = ModelInstance::new("test");
        m.declare_var("X", 1).unwrap();
        let x = m.add_var("X", vec![], Bounds::free()).unwrap();
        m.add_constraint("Cap", vec![], Expression::from(x), ConstraintSense::Leq, 4.0)
            .unwrap();
        assert!(m
            .add_constraint("Cap", vec![], Expression::from(x), ConstraintSense::Leq, 4.0)
            .is_err());
        assert_eq!(m.num_constraints(), 1);

        let (_vars, constraints) = m.into_parts();
        assert_eq!(constraints.len(), 1);
    }
}
