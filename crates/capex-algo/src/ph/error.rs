use capex_core::{CapexError, VariableId};
use thiserror::Error;

/// Errors raised while extracting cost coefficients or setting rho values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RhoError {
    /// A term of the cost expression refers to a variable the resolver does not know.
    /// Dropping the term would silently corrupt the cost attribution.
    #[error("cost expression term {term} refers to a variable with no symbol ({variable})")]
    UnresolvedVariable { term: usize, variable: String },

    /// Coefficient and name maps do not cover the same variables.
    #[error("coefficient and name maps disagree on {} variable(s): {}", .ids.len(), format_ids(.ids))]
    NameMismatch { ids: Vec<VariableId> },

    /// The named first-stage cost expression is not part of the instance.
    #[error("cost expression '{expression}' not found in model instance '{instance}'")]
    MissingCostExpression { expression: String, instance: String },

    /// A scenario's node list names a node the tree does not contain.
    #[error("scenario '{scenario}' refers to unknown tree node '{node}'")]
    UnknownTreeNode { scenario: String, node: String },
}

fn format_ids(ids: &[VariableId]) -> String {
    ids.iter()
        .map(VariableId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<RhoError> for CapexError {
    fn from(err: RhoError) -> Self {
        match err {
            RhoError::UnknownTreeNode { .. } => CapexError::Validation(err.to_string()),
            RhoError::MissingCostExpression { .. } => CapexError::Model(err.to_string()),
            other => CapexError::Other(other.to_string()),
        }
    }
}
