//! The approval workflow.
//!
//! Opens one ticket per pending request, notifies the approver channel,
//! and suspends the calling task until a governor resolves the ticket or
//! the timeout fires. Absence of a decision is a denial: timeout and
//! cancellation both finalize the ticket as expired, and an expired ticket
//! authorizes nothing.

use async_trait::async_trait;
use charter_audit::{AuditEvent, AuditLog};
use charter_core::{
    ActClass, ActionRequest, Granularity, PrincipalId, RequestId, TargetScope, TicketId, Timestamp,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::error::{ApprovalError, ApprovalResult};
use crate::hook::{GovernanceHook, HookBus};
use crate::ticket::{ApprovalDecision, ApprovalTicket, TicketStatus};

/// Default wait before an unresolved ticket expires (5 minutes).
pub const DEFAULT_TICKET_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Delivery channel for approval notifications.
///
/// The engine does not know or care whether the far side is email, chat,
/// or a queue; a notification failure is logged and the ticket simply
/// waits out its timeout.
#[async_trait]
pub trait ApproverChannel: Send + Sync {
    /// Tell the scope's governor a ticket awaits them.
    async fn notify(&self, ticket: &ApprovalTicket);
}

/// Identity check for resolvers.
#[async_trait]
pub trait GovernorDirectory: Send + Sync {
    /// Whether the principal holds the governor role for the scope.
    async fn is_governor(&self, principal_id: &PrincipalId, scope: &TargetScope) -> bool;
}

/// Directory backed by a fixed set of governor principals.
///
/// Suits single-tenant deployments and tests; larger deployments implement
/// [`GovernorDirectory`] against their identity provider.
#[derive(Debug, Default)]
pub struct StaticGovernorDirectory {
    governors: HashSet<PrincipalId>,
}

impl StaticGovernorDirectory {
    /// Build a directory from governor principal IDs.
    #[must_use]
    pub fn new(governors: impl IntoIterator<Item = PrincipalId>) -> Self {
        Self {
            governors: governors.into_iter().collect(),
        }
    }
}

#[async_trait]
impl GovernorDirectory for StaticGovernorDirectory {
    async fn is_governor(&self, principal_id: &PrincipalId, _scope: &TargetScope) -> bool {
        self.governors.contains(principal_id)
    }
}

/// The approval workflow.
pub struct ApprovalWorkflow {
    tickets: DashMap<TicketId, ApprovalTicket>,
    open_by_request: DashMap<RequestId, TicketId>,
    waiters: DashMap<TicketId, oneshot::Sender<ApprovalTicket>>,
    channel: Arc<dyn ApproverChannel>,
    governors: Arc<dyn GovernorDirectory>,
    audit: Arc<AuditLog>,
    hooks: HookBus,
    timeout: Duration,
}

impl ApprovalWorkflow {
    /// Create a workflow.
    #[must_use]
    pub fn new(
        channel: Arc<dyn ApproverChannel>,
        governors: Arc<dyn GovernorDirectory>,
        audit: Arc<AuditLog>,
        timeout: Duration,
    ) -> Self {
        Self {
            tickets: DashMap::new(),
            open_by_request: DashMap::new(),
            waiters: DashMap::new(),
            channel,
            governors,
            audit,
            hooks: HookBus::new(),
            timeout,
        }
    }

    /// The bus this workflow publishes ticket transitions on.
    #[must_use]
    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    /// Open a ticket for the request, notify the approver channel, and
    /// suspend until resolution or timeout. The returned ticket is always
    /// terminal.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::DuplicateOpenTicket`] if the request already
    /// has an open ticket, or an audit error if the opening entry cannot be
    /// written (in which case no ticket exists afterwards).
    pub async fn request_approval(
        &self,
        request: &ActionRequest,
        approval_type: ActClass,
        granularity: Granularity,
        approver_scope: TargetScope,
    ) -> ApprovalResult<ApprovalTicket> {
        let ticket = ApprovalTicket::open(
            request.request_id.clone(),
            approval_type,
            granularity,
            approver_scope,
        );
        let ticket_id = ticket.ticket_id.clone();

        let (tx, rx) = oneshot::channel();
        self.tickets.insert(ticket_id.clone(), ticket.clone());
        self.waiters.insert(ticket_id.clone(), tx);

        // Claiming the per-request slot doubles as the occupancy check;
        // entry() makes the check and the claim one step, so concurrent
        // duplicates cannot both open a ticket.
        match self.open_by_request.entry(request.request_id.clone()) {
            Entry::Occupied(_) => {
                self.tickets.remove(&ticket_id);
                self.waiters.remove(&ticket_id);
                return Err(ApprovalError::DuplicateOpenTicket(request.request_id.clone()));
            },
            Entry::Vacant(slot) => {
                slot.insert(ticket_id.clone());
            },
        }

        // The ticket exists only if its opening is audited.
        if let Err(e) = self
            .audit
            .append(AuditEvent::TicketOpened {
                ticket_id: ticket_id.clone(),
                request_id: request.request_id.clone(),
                approval_type,
                granularity,
                approver_scope: ticket.approver_scope.clone(),
            })
            .await
        {
            self.tickets.remove(&ticket_id);
            self.open_by_request.remove(&request.request_id);
            self.waiters.remove(&ticket_id);
            return Err(e.into());
        }

        self.hooks.publish(GovernanceHook::TicketOpened {
            ticket: ticket.clone(),
        });
        self.channel.notify(&ticket).await;

        tracing::info!(ticket = %ticket_id, request = %request.request_id, "awaiting approval");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resolved)) => Ok(resolved),
            // Timeout, or the waiter sender vanished: fail closed.
            Ok(Err(_)) | Err(_) => self.expire(&ticket_id).await,
        }
    }

    /// Resolve an open ticket.
    ///
    /// Idempotent: resolving an already-terminal ticket returns the original
    /// resolution unchanged and audits a duplicate-resolution entry.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::NotGovernor`] unless the resolver holds the
    /// governor role for the ticket's scope, and
    /// [`ApprovalError::TicketNotFound`] for an unknown ticket.
    pub async fn resolve(
        &self,
        ticket_id: &TicketId,
        decision: ApprovalDecision,
        resolver: &PrincipalId,
    ) -> ApprovalResult<ApprovalTicket> {
        let scope = self
            .tickets
            .get(ticket_id)
            .map(|t| t.approver_scope.clone())
            .ok_or_else(|| ApprovalError::TicketNotFound(ticket_id.clone()))?;

        if !self.governors.is_governor(resolver, &scope).await {
            return Err(ApprovalError::NotGovernor {
                principal_id: resolver.clone(),
                scope,
            });
        }

        // Transition under the entry lock; never hold it across an await.
        let (resolved, was_duplicate) = {
            let mut entry = self
                .tickets
                .get_mut(ticket_id)
                .ok_or_else(|| ApprovalError::TicketNotFound(ticket_id.clone()))?;
            if entry.status.is_terminal() {
                (entry.clone(), true)
            } else {
                entry.status = match decision {
                    ApprovalDecision::Approve => TicketStatus::Approved,
                    ApprovalDecision::Reject => TicketStatus::Rejected,
                };
                entry.resolved_at = Some(Timestamp::now());
                entry.resolved_by = Some(resolver.clone());
                (entry.clone(), false)
            }
        };

        if was_duplicate {
            tracing::warn!(ticket = %ticket_id, resolver = %resolver, "duplicate resolution");
            self.audit
                .append(AuditEvent::DuplicateResolution {
                    ticket_id: ticket_id.clone(),
                    attempted_by: resolver.clone(),
                })
                .await?;
            return Ok(resolved);
        }

        self.open_by_request.remove(&resolved.request_id);
        self.audit
            .append(AuditEvent::TicketResolved {
                ticket_id: ticket_id.clone(),
                request_id: resolved.request_id.clone(),
                approved: resolved.is_approved(),
                resolved_by: resolver.clone(),
            })
            .await?;
        self.hooks.publish(GovernanceHook::TicketResolved {
            ticket: resolved.clone(),
        });

        if let Some((_, tx)) = self.waiters.remove(ticket_id) {
            // The waiter may have been cancelled; expiry covers that.
            let _ = tx.send(resolved.clone());
        }

        tracing::info!(ticket = %ticket_id, status = %resolved.status, "ticket resolved");
        Ok(resolved)
    }

    /// Finalize an unresolved ticket as expired.
    ///
    /// Used by the timeout path and by callers that observe a disconnect.
    /// If a resolution raced in first, the resolution wins and is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::TicketNotFound`] for an unknown ticket, or
    /// an audit error if the expiry entry cannot be written.
    pub async fn expire(&self, ticket_id: &TicketId) -> ApprovalResult<ApprovalTicket> {
        let (ticket, already_terminal) = {
            let mut entry = self
                .tickets
                .get_mut(ticket_id)
                .ok_or_else(|| ApprovalError::TicketNotFound(ticket_id.clone()))?;
            if entry.status.is_terminal() {
                (entry.clone(), true)
            } else {
                entry.status = TicketStatus::Expired;
                entry.resolved_at = Some(Timestamp::now());
                (entry.clone(), false)
            }
        };

        if already_terminal {
            return Ok(ticket);
        }

        self.open_by_request.remove(&ticket.request_id);
        self.waiters.remove(ticket_id);

        self.audit
            .append(AuditEvent::TicketExpired {
                ticket_id: ticket_id.clone(),
                request_id: ticket.request_id.clone(),
            })
            .await?;
        self.hooks.publish(GovernanceHook::TicketExpired {
            ticket: ticket.clone(),
        });

        tracing::warn!(ticket = %ticket_id, "ticket expired unresolved");
        Ok(ticket)
    }

    /// Fetch a ticket by ID.
    #[must_use]
    pub fn get_ticket(&self, ticket_id: &TicketId) -> Option<ApprovalTicket> {
        self.tickets.get(ticket_id).map(|t| t.clone())
    }

    /// Number of tickets currently open.
    #[must_use]
    pub fn open_ticket_count(&self) -> usize {
        self.open_by_request.len()
    }
}
