//! Query execution errors.

use thiserror::Error;

use crate::catalog::CatalogError;

/// Result type for query execution.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Query execution errors.
///
/// None of these are retried: any error aborts the query.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("ambiguous column: {0}")]
    AmbiguousColumn(String),

    #[error("type coercion failed: {0}")]
    TypeCoercion(String),

    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("tuple index {index} out of range for tuple of {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecuteError {
    pub(crate) fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        ExecuteError::Io {
            path: path.to_string(),
            source,
        }
    }

    /// Whether this error comes from binding a column reference.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, ExecuteError::UnknownColumn(_) | ExecuteError::AmbiguousColumn(_))
    }
}
