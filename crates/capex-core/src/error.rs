//! Unified error types for the capex workspace
//!
//! [`CapexError`] is the common error type returned at API boundaries.
//! Algorithm-specific errors (for example the rho-setting errors in
//! `capex-algo`) convert into it so callers can use `?` throughout.
//!
//! # Example
//!
//! ```ignore
//! use capex_core::{CapexError, CapexResult};
//!
//! fn build(path: &Path) -> CapexResult<ModelInstance> {
//!     let data = ModelData::from_path(path)?;
//!     build_instance(&data, &data.resolve_scenarios()[0], &options)
//! }
//! ```

use thiserror::Error;

/// Unified error type for capex operations.
#[derive(Error, Debug)]
pub enum CapexError {
    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Model construction errors (duplicate components, missing registries, ...)
    #[error("Model error: {0}")]
    Model(String),

    /// Solver errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wrapped loader errors, with their context chain
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using CapexError.
pub type CapexResult<T> = Result<T, CapexError>;

impl From<anyhow::Error> for CapexError {
    fn from(err: anyhow::Error) -> Self {
        CapexError::Other(format!("{err:#}"))
    }
}
