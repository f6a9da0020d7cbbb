//! Action requests submitted for a governance decision.

use charter_crypto::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{ActClass, PrincipalId, RequestId, TargetScope, TicketId, Timestamp};

/// A request to perform a governed action.
///
/// Immutable once submitted: a correction is a new request with a new
/// `request_id`, never an edit of this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Unique identifier for this request.
    pub request_id: RequestId,
    /// The principal submitting the request.
    pub principal_id: PrincipalId,
    /// Effect-boundary classification claimed by the submitter. The engine
    /// re-derives the class from its rule table and trusts that instead.
    pub act_class: ActClass,
    /// Registered action type, e.g. `"publish_post"` or `"send_payment"`.
    pub action_type: String,
    /// What the action targets.
    pub target_scope: TargetScope,
    /// BLAKE3 digest of the action payload. The payload itself never enters
    /// the engine.
    pub payload_digest: ContentHash,
    /// When the request was submitted.
    pub submitted_at: Timestamp,
    /// A previously issued approval ticket the submitter presents as
    /// authorization, if any. Checked against the required class; an
    /// artifact ticket presented for an execution boundary is a bypass
    /// attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presented_ticket: Option<TicketId>,
}

impl ActionRequest {
    /// Create a new request with a fresh ID and the current time.
    #[must_use]
    pub fn new(
        principal_id: impl Into<PrincipalId>,
        act_class: ActClass,
        action_type: impl Into<String>,
        target_scope: TargetScope,
        payload_digest: ContentHash,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            principal_id: principal_id.into(),
            act_class,
            action_type: action_type.into(),
            target_scope,
            payload_digest,
            submitted_at: Timestamp::now(),
            presented_ticket: None,
        }
    }

    /// Attach a previously issued ticket as claimed authorization.
    #[must_use]
    pub fn with_ticket(mut self, ticket_id: TicketId) -> Self {
        self.presented_ticket = Some(ticket_id);
        self
    }

    /// Structural validation, applied before any decision step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] if the action type or principal
    /// is empty, or the submission time is in the future.
    pub fn validate(&self) -> CoreResult<()> {
        if self.action_type.trim().is_empty() {
            return Err(CoreError::InvalidRequest("empty action_type".into()));
        }
        if self.principal_id.as_str().trim().is_empty() {
            return Err(CoreError::InvalidRequest("empty principal_id".into()));
        }
        if self.submitted_at.is_future() {
            return Err(CoreError::InvalidRequest(
                "submitted_at is in the future".into(),
            ));
        }
        Ok(())
    }
}
