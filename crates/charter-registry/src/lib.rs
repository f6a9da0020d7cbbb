//! Charter Registry - precedent seeds and versioned entities.
//!
//! Precedent seeds are reusable rule outcomes grown from decided requests.
//! A seed can only ever clarify a decision or add a gate to it; effects
//! that would weaken approvals are rejected at registration, not merely
//! discouraged. Matching is deterministic and snapshot-based, so decisions
//! in flight are unaffected by concurrent supersessions.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod entity;
mod error;
mod registry;
mod seed;

pub use entity::{Amendment, EntityRecord, EntityStore, LifecycleState};
pub use error::{RegistryError, RegistryResult};
pub use registry::{SeedRegistry, SeedSnapshot};
pub use seed::{MatchCriteria, PrecedentSeed, SeedEffect};
