//! Approval tickets.

use charter_core::{ActClass, Granularity, PrincipalId, RequestId, TargetScope, TicketId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a ticket. `Open` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Awaiting a governor.
    Open,
    /// Approved by a governor.
    Approved,
    /// Rejected by a governor.
    Rejected,
    /// Timed out or cancelled without resolution.
    Expired,
}

impl TicketStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A governor's answer to an open ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Let the action proceed.
    Approve,
    /// Refuse the action.
    Reject,
}

/// An approval ticket, created only for `pending` verdicts.
///
/// Resolution is terminal and immutable: once a ticket leaves `Open` it
/// never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTicket {
    /// Unique ticket identifier.
    pub ticket_id: TicketId,
    /// The request awaiting approval.
    pub request_id: RequestId,
    /// The approval class this ticket covers. A ticket never authorizes a
    /// class above its own.
    pub approval_type: ActClass,
    /// Coverage of the approval.
    pub granularity: Granularity,
    /// Scope whose governor must resolve the ticket.
    pub approver_scope: TargetScope,
    /// Lifecycle status.
    pub status: TicketStatus,
    /// When the ticket was opened.
    pub opened_at: Timestamp,
    /// When it reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Timestamp>,
    /// The resolving governor, absent for expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<PrincipalId>,
}

impl ApprovalTicket {
    /// Open a ticket for a request.
    #[must_use]
    pub fn open(
        request_id: RequestId,
        approval_type: ActClass,
        granularity: Granularity,
        approver_scope: TargetScope,
    ) -> Self {
        Self {
            ticket_id: TicketId::new(),
            request_id,
            approval_type,
            granularity,
            approver_scope,
            status: TicketStatus::Open,
            opened_at: Timestamp::now(),
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// Whether the ticket ended approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == TicketStatus::Approved
    }

    /// Whether a ticket of this class may authorize the given boundary.
    ///
    /// Authorization never transfers upward: an artifact ticket covers
    /// artifact actions only, never a communication or execution boundary.
    #[must_use]
    pub fn covers(&self, class: ActClass) -> bool {
        self.approval_type == class
    }
}
