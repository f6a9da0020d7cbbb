//! Charter Guard - budget and rate limiting for governed principals.
//!
//! Tracks per-principal task counts and spend against per-tier caps on
//! UTC-day periods. The core operation, [`BudgetGuard::check_and_consume`],
//! is atomic per principal: under concurrent load the caps hold exactly.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod guard;

pub use guard::{BudgetGuard, BudgetResult, BudgetState, ExceededReason, TierCaps};
