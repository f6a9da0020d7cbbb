//! Charter Approval - human-in-the-loop approval workflow.
//!
//! Pending verdicts open an [`ApprovalTicket`] routed to the governor of
//! the target scope. The requesting task suspends on the ticket and resumes
//! when a governor resolves it; an unresolved ticket expires at the timeout
//! and denies the action. Every ticket transition is written to the audit
//! chain and fanned out on the [`HookBus`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod hook;
mod ticket;
mod workflow;

pub use error::{ApprovalError, ApprovalResult};
pub use hook::{GovernanceHook, HookBus, HookReceiver, DEFAULT_HOOK_CAPACITY};
pub use ticket::{ApprovalDecision, ApprovalTicket, TicketStatus};
pub use workflow::{
    ApprovalWorkflow, ApproverChannel, GovernorDirectory, StaticGovernorDirectory,
    DEFAULT_TICKET_TIMEOUT,
};
