//! Per-principal budget accounting with atomic check-and-consume.
//!
//! The check and the increment happen under one map-entry lock, so two
//! concurrent requests can never both pass a cap with only one slot left.

use charter_core::{PrincipalId, Tier, Timestamp};
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Spending and rate caps for one tier. `None` means uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCaps {
    /// Maximum decided tasks per UTC day.
    pub max_tasks_per_day: Option<u32>,
    /// Maximum spend per UTC day, in cents.
    pub max_spend_cents_per_day: Option<u64>,
    /// Maximum consumed requests per minute.
    pub max_requests_per_minute: Option<u32>,
}

impl TierCaps {
    /// Uncapped (used for internal principals).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_tasks_per_day: None,
            max_spend_cents_per_day: None,
            max_requests_per_minute: None,
        }
    }
}

/// Per-principal counters for the current UTC-day period.
///
/// Counters only move up; the sole reset is the day rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetState {
    /// UTC day this period covers.
    pub period_start: NaiveDate,
    /// Tasks consumed this period.
    pub task_count: u32,
    /// Cents spent this period.
    pub spend_cents: u64,
    /// Unix minute the rate window covers.
    pub minute_start: i64,
    /// Requests consumed inside the rate window.
    pub minute_count: u32,
}

impl BudgetState {
    fn fresh(day: NaiveDate, minute: i64) -> Self {
        Self {
            period_start: day,
            task_count: 0,
            spend_cents: 0,
            minute_start: minute,
            minute_count: 0,
        }
    }
}

/// Why consumption was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExceededReason {
    /// The daily task ceiling was hit.
    DailyTaskCeiling {
        /// The configured ceiling.
        limit: u32,
    },
    /// The daily spend cap would be exceeded.
    SpendCap {
        /// The configured cap in cents.
        limit_cents: u64,
    },
    /// The per-minute request ceiling was hit.
    RateCeiling {
        /// The configured per-minute ceiling.
        limit: u32,
    },
}

/// Outcome of a consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetResult {
    /// Consumed; remaining headroom in this period (`None` = uncapped).
    Allowed {
        /// Tasks left today.
        remaining_tasks: Option<u32>,
        /// Cents left today.
        remaining_spend_cents: Option<u64>,
    },
    /// Refused; counters unchanged.
    Exceeded(ExceededReason),
}

impl BudgetResult {
    /// Whether the attempt consumed budget.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Concurrent budget guard over all principals.
pub struct BudgetGuard {
    states: DashMap<PrincipalId, BudgetState>,
    caps: HashMap<Tier, TierCaps>,
}

impl BudgetGuard {
    /// Create a guard with the given per-tier caps. Tiers absent from the
    /// map are uncapped.
    #[must_use]
    pub fn new(caps: HashMap<Tier, TierCaps>) -> Self {
        Self {
            states: DashMap::new(),
            caps,
        }
    }

    fn caps_for(&self, tier: Tier) -> TierCaps {
        self.caps.get(&tier).copied().unwrap_or(TierCaps::unlimited())
    }

    /// Atomically check the principal's caps and, if within them, consume
    /// one task plus `cost_cents` of spend.
    pub fn check_and_consume(
        &self,
        principal_id: &PrincipalId,
        tier: Tier,
        cost_cents: u64,
    ) -> BudgetResult {
        let caps = self.caps_for(tier);
        let now = Timestamp::now();
        let today = now.utc_day();
        let minute = now.0.timestamp() / 60;

        // The entry guard holds the shard lock for the whole check+update.
        let mut entry = self
            .states
            .entry(principal_id.clone())
            .or_insert_with(|| BudgetState::fresh(today, minute));

        if entry.period_start != today {
            tracing::debug!(principal = %principal_id, day = %today, "budget period rollover");
            *entry = BudgetState::fresh(today, minute);
        }
        if entry.minute_start != minute {
            entry.minute_start = minute;
            entry.minute_count = 0;
        }

        if let Some(limit) = caps.max_requests_per_minute {
            if entry.minute_count >= limit {
                return BudgetResult::Exceeded(ExceededReason::RateCeiling { limit });
            }
        }
        if let Some(limit) = caps.max_tasks_per_day {
            if entry.task_count >= limit {
                return BudgetResult::Exceeded(ExceededReason::DailyTaskCeiling { limit });
            }
        }
        if let Some(limit_cents) = caps.max_spend_cents_per_day {
            if entry.spend_cents.saturating_add(cost_cents) > limit_cents {
                return BudgetResult::Exceeded(ExceededReason::SpendCap { limit_cents });
            }
        }

        entry.task_count += 1;
        entry.spend_cents = entry.spend_cents.saturating_add(cost_cents);
        entry.minute_count += 1;

        BudgetResult::Allowed {
            remaining_tasks: caps.max_tasks_per_day.map(|l| l - entry.task_count),
            remaining_spend_cents: caps
                .max_spend_cents_per_day
                .map(|l| l.saturating_sub(entry.spend_cents)),
        }
    }

    /// Current counters for a principal, if any exist this period.
    #[must_use]
    pub fn state(&self, principal_id: &PrincipalId) -> Option<BudgetState> {
        self.states.get(principal_id).map(|s| *s)
    }

    /// Number of principals with live counters.
    #[must_use]
    pub fn tracked_principals(&self) -> usize {
        self.states.len()
    }
}
