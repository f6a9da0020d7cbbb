//! Approval error types.

use charter_core::{PrincipalId, RequestId, TargetScope, TicketId};
use thiserror::Error;

/// Errors that can occur in the approval workflow.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No ticket with this ID exists.
    #[error("ticket {0} not found")]
    TicketNotFound(TicketId),

    /// The request already has an open ticket.
    #[error("request {0} already has an open ticket")]
    DuplicateOpenTicket(RequestId),

    /// The resolver does not hold the governor role for the scope.
    #[error("{principal_id} is not a governor for {scope}")]
    NotGovernor {
        /// The rejected resolver.
        principal_id: PrincipalId,
        /// The scope the ticket is routed to.
        scope: TargetScope,
    },

    /// The audit chain refused the write; the operation fails with it.
    #[error(transparent)]
    Audit(#[from] charter_audit::AuditError),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
