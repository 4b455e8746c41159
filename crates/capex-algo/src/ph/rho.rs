//! Cost-proportional rho assignment over scenario tree nodes.

use super::{CoefficientMap, NameMap, RhoError};
use capex_core::{VariableId, VariableMembership};

/// Assign `coefficient * scale` as rho to every variable in `coefficients`.
///
/// For each variable (in ascending id order) the nodes are searched in the
/// order given; the first node that owns the variable receives exactly one
/// `setter(node, id, value)` call. Variables owned by no node are returned
/// so the caller can warn about them.
///
/// Fails before any setter call if `coefficients` and `names` do not cover
/// the same variables.
pub fn assign_rho<N, F>(
    coefficients: &CoefficientMap,
    names: &NameMap,
    tree_nodes: &[N],
    mut setter: F,
    scale: f64,
) -> Result<Vec<VariableId>, RhoError>
where
    N: VariableMembership,
    F: FnMut(&N, &VariableId, f64),
{
    check_keys(coefficients, names)?;

    let mut unassigned = Vec::new();
    for (id, coefficient) in coefficients {
        match tree_nodes.iter().find(|node| node.contains_variable(id)) {
            Some(node) => setter(node, id, coefficient * scale),
            None => unassigned.push(*id),
        }
    }
    Ok(unassigned)
}

fn check_keys(coefficients: &CoefficientMap, names: &NameMap) -> Result<(), RhoError> {
    if coefficients.len() == names.len() && coefficients.keys().eq(names.keys()) {
        return Ok(());
    }
    let mut ids: Vec<VariableId> = coefficients
        .keys()
        .filter(|id| !names.contains_key(id))
        .chain(names.keys().filter(|id| !coefficients.contains_key(id)))
        .copied()
        .collect();
    ids.sort();
    Err(RhoError::NameMismatch { ids })
}
