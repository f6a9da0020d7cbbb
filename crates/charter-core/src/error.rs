//! Core error types.

use thiserror::Error;

/// Errors for domain-type validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The action request failed structural validation.
    #[error("invalid action request: {0}")]
    InvalidRequest(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
