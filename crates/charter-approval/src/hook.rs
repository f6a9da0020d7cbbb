//! Hook bus for governance events.
//!
//! Broadcast channel fanning ticket transitions and security alerts out to
//! subscribers (notification bridges, dashboards, the gateway). Slow
//! subscribers lag and drop; they never slow the decision path.

use charter_core::{PrincipalId, RequestId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::ticket::ApprovalTicket;

/// Default channel capacity for the hook bus.
pub const DEFAULT_HOOK_CAPACITY: usize = 1024;

/// A governance event published on the hook bus.
#[derive(Debug, Clone)]
pub enum GovernanceHook {
    /// A ticket was opened and awaits a governor.
    TicketOpened {
        /// The opened ticket.
        ticket: ApprovalTicket,
    },
    /// A ticket reached a terminal resolution.
    TicketResolved {
        /// The resolved ticket.
        ticket: ApprovalTicket,
    },
    /// A ticket expired unresolved.
    TicketExpired {
        /// The expired ticket.
        ticket: ApprovalTicket,
    },
    /// A bypass attempt or other violation was detected.
    SecurityAlert {
        /// The offending request.
        request_id: RequestId,
        /// The submitting principal.
        principal_id: PrincipalId,
        /// What happened.
        details: String,
    },
}

impl GovernanceHook {
    /// Short event name for logging.
    #[must_use]
    pub fn hook_type(&self) -> &'static str {
        match self {
            Self::TicketOpened { .. } => "ticket_opened",
            Self::TicketResolved { .. } => "ticket_resolved",
            Self::TicketExpired { .. } => "ticket_expired",
            Self::SecurityAlert { .. } => "security_alert",
        }
    }
}

/// Broadcast bus for [`GovernanceHook`] events.
#[derive(Debug)]
pub struct HookBus {
    sender: broadcast::Sender<Arc<GovernanceHook>>,
    capacity: usize,
}

impl HookBus {
    /// Create a bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HOOK_CAPACITY)
    }

    /// Create a bus with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish a hook to all subscribers, returning the receiver count.
    pub fn publish(&self, hook: GovernanceHook) -> usize {
        let hook = Arc::new(hook);
        match self.sender.send(Arc::clone(&hook)) {
            Ok(count) => {
                debug!(hook = hook.hook_type(), receivers = count, "hook published");
                count
            },
            Err(_) => {
                // No receivers; nothing waits on hooks.
                trace!(hook = hook.hook_type(), "no receivers for hook");
                0
            },
        }
    }

    /// Subscribe to all future hooks.
    #[must_use]
    pub fn subscribe(&self) -> HookReceiver {
        HookReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Current number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HookBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HookBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}

/// Receiver for hooks from the bus.
pub struct HookReceiver {
    receiver: broadcast::Receiver<Arc<GovernanceHook>>,
}

impl HookReceiver {
    /// Receive the next hook.
    ///
    /// Returns `None` when the bus is closed. A lagged receiver logs the
    /// dropped count and keeps receiving.
    pub async fn recv(&mut self) -> Option<Arc<GovernanceHook>> {
        loop {
            match self.receiver.recv().await {
                Ok(hook) => return Some(hook),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "hook receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive without blocking; `None` if nothing is queued.
    pub fn try_recv(&mut self) -> Option<Arc<GovernanceHook>> {
        loop {
            match self.receiver.try_recv() {
                Ok(hook) => return Some(hook),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "hook receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_core::{ActClass, Granularity, TargetScope};

    fn ticket() -> ApprovalTicket {
        ApprovalTicket::open(
            RequestId::new(),
            ActClass::Execution,
            Granularity::PerAction,
            TargetScope::Platform,
        )
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = HookBus::new();
        let mut receiver = bus.subscribe();

        let count = bus.publish(GovernanceHook::TicketOpened { ticket: ticket() });
        assert_eq!(count, 1);

        let hook = receiver.recv().await.unwrap();
        assert_eq!(hook.hook_type(), "ticket_opened");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = HookBus::new();
        assert_eq!(
            bus.publish(GovernanceHook::TicketExpired { ticket: ticket() }),
            0
        );
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let bus = HookBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(GovernanceHook::SecurityAlert {
            request_id: RequestId::new(),
            principal_id: PrincipalId::new("usr-1"),
            details: "artifact ticket presented for execution".into(),
        });

        assert_eq!(a.recv().await.unwrap().hook_type(), "security_alert");
        assert_eq!(b.recv().await.unwrap().hook_type(), "security_alert");
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = HookBus::new();
        let mut receiver = bus.subscribe();
        assert!(receiver.try_recv().is_none());
    }
}
