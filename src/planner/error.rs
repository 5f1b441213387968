//! Planning errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::executor::ExecuteError;

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Query planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("order by column not in output: {0}")]
    OrderByNotInOutput(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Column binding or operator construction failed.
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}
