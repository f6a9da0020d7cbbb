//! Engine error types.

use charter_core::PrincipalId;
use thiserror::Error;

/// Errors that can occur while deciding a request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request failed structural validation.
    #[error(transparent)]
    Validation(#[from] charter_core::CoreError),

    /// The action type is not in the rule table. Rejected before any
    /// decision is recorded.
    #[error("action type {action_type:?} is not registered")]
    UnregisteredAction {
        /// The unknown action type.
        action_type: String,
    },

    /// The submitting principal is unknown to the directory.
    #[error("unknown principal {0}")]
    UnknownPrincipal(PrincipalId),

    /// A seed registration or supersession was refused.
    #[error(transparent)]
    Registry(#[from] charter_registry::RegistryError),

    /// The approval workflow failed.
    #[error(transparent)]
    Approval(#[from] charter_approval::ApprovalError),

    /// The audit chain refused the write; the decision fails with it.
    #[error(transparent)]
    Audit(#[from] charter_audit::AuditError),
}

impl EngineError {
    /// Whether this is a validation failure the caller can fix by
    /// correcting the request.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnregisteredAction { .. } | Self::UnknownPrincipal(_)
        )
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
