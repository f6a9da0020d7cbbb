//! Decision verdicts and their string-stable reason codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ActClass, PrincipalId, RequestId, Timestamp};

/// Terminal or interim outcome of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictOutcome {
    /// The action may proceed.
    Allow,
    /// The action must not proceed.
    Deny,
    /// Waiting on an open approval ticket. At most one `pending` verdict
    /// precedes a terminal outcome for a given request.
    Pending,
}

impl fmt::Display for VerdictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Machine-readable reason for a verdict.
///
/// The wire strings are stable; downstream consumers match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// A governor approved the required ticket.
    Approved,
    /// A precedent seed added a gate to this decision.
    PrecedentGated,
    /// An approval ticket was opened; decision is pending.
    ApprovalRequired,
    /// The governor rejected the ticket.
    ApprovalRejected,
    /// The ticket expired without resolution.
    ApprovalExpired,
    /// The principal's budget caps would be exceeded.
    BudgetExceeded,
    /// The principal's request rate ceiling was hit.
    RateLimited,
    /// A lower-class ticket was presented for a higher boundary.
    ExecBypass,
    /// The action type is not in the rule table.
    UnregisteredAction,
}

impl ReasonCode {
    /// The stable wire string for this code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::PrecedentGated => "PRECEDENT_GATED",
            Self::ApprovalRequired => "APPROVAL_REQUIRED",
            Self::ApprovalRejected => "APPROVAL_REJECTED",
            Self::ApprovalExpired => "APPROVAL_EXPIRED",
            Self::BudgetExceeded => "BUDGET_EXCEEDED",
            Self::RateLimited => "RATE_LIMITED",
            Self::ExecBypass => "EXEC_BYPASS",
            Self::UnregisteredAction => "UNREGISTERED_ACTION",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who produced a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by")]
pub enum DecidedBy {
    /// The engine decided without human input.
    System,
    /// A governor's ticket resolution decided the outcome.
    Governor {
        /// The resolving governor.
        principal_id: PrincipalId,
    },
}

/// The engine's decision for one action request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// The request this verdict decides.
    pub request_id: RequestId,
    /// Outcome.
    pub outcome: VerdictOutcome,
    /// Why.
    pub reason_code: ReasonCode,
    /// The approval class that was (or would be) required, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_approval_type: Option<ActClass>,
    /// When the verdict was produced.
    pub decided_at: Timestamp,
    /// Who produced it.
    pub decided_by: DecidedBy,
}

impl Verdict {
    /// An `allow` verdict.
    #[must_use]
    pub fn allow(request_id: RequestId, reason_code: ReasonCode, decided_by: DecidedBy) -> Self {
        Self {
            request_id,
            outcome: VerdictOutcome::Allow,
            reason_code,
            required_approval_type: None,
            decided_at: Timestamp::now(),
            decided_by,
        }
    }

    /// A `deny` verdict.
    #[must_use]
    pub fn deny(request_id: RequestId, reason_code: ReasonCode, decided_by: DecidedBy) -> Self {
        Self {
            request_id,
            outcome: VerdictOutcome::Deny,
            reason_code,
            required_approval_type: None,
            decided_at: Timestamp::now(),
            decided_by,
        }
    }

    /// Record the approval class this verdict turned on.
    #[must_use]
    pub fn with_required_approval(mut self, required: ActClass) -> Self {
        self.required_approval_type = Some(required);
        self
    }

    /// Whether the action may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.outcome == VerdictOutcome::Allow
    }
}
