//! Linear cost coefficients from a canonical linear expression.

use super::RhoError;
use capex_core::{SymbolResolver, VariableId};
use good_lp::{Expression, IntoAffineExpression, Variable};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Variable id -> linear cost coefficient.
pub type CoefficientMap = BTreeMap<VariableId, f64>;

/// Variable id -> display name, built in lockstep with [`CoefficientMap`].
pub type NameMap = BTreeMap<VariableId, String>;

/// An expression that can present its canonical linear form: one
/// `(variable, coefficient)` pair per term. Constant terms are not part of
/// the linear form.
pub trait CanonicalLinear {
    type Var: Debug;

    fn linear_terms(&self) -> Vec<(Self::Var, f64)>;
}

impl CanonicalLinear for Expression {
    type Var = Variable;

    fn linear_terms(&self) -> Vec<(Variable, f64)> {
        IntoAffineExpression::linear_coefficients(self).collect()
    }
}

impl<V: Clone + Debug> CanonicalLinear for [(V, f64)] {
    type Var = V;

    fn linear_terms(&self) -> Vec<(V, f64)> {
        self.to_vec()
    }
}

/// Extract the linear coefficient of every variable in `expr`.
///
/// Repeated terms for the same variable are summed; variables whose total
/// coefficient is zero are left out of both maps. Any variable the resolver
/// cannot map aborts the extraction.
pub fn extract_cost_coefficients<E, R>(
    expr: &E,
    resolver: &R,
) -> Result<(CoefficientMap, NameMap), RhoError>
where
    E: CanonicalLinear + ?Sized,
    R: SymbolResolver<E::Var> + ?Sized,
{
    let mut coefficients = CoefficientMap::new();
    let mut names = NameMap::new();

    for (term, (var, coefficient)) in expr.linear_terms().into_iter().enumerate() {
        let symbol = resolver
            .resolve(&var)
            .ok_or_else(|| RhoError::UnresolvedVariable {
                term,
                variable: format!("{:?}", var),
            })?;
        *coefficients.entry(symbol.id).or_insert(0.0) += coefficient;
        names.entry(symbol.id).or_insert(symbol.name);
    }

    coefficients.retain(|_, c| *c != 0.0);
    names.retain(|id, _| coefficients.contains_key(id));

    Ok((coefficients, names))
}
