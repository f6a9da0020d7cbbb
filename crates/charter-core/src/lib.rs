//! Charter Core - shared domain types for the governance engine.
//!
//! This crate defines the vocabulary every other charter crate speaks:
//! principals and their roles/tiers, action requests, effect-boundary
//! classes, target scopes, verdicts, and the string-stable reason codes
//! carried on every decision.
//!
//! # Example
//!
//! ```
//! use charter_core::{ActClass, ActionRequest, TargetScope};
//! use charter_crypto::ContentHash;
//!
//! let request = ActionRequest::new(
//!     "usr-1",
//!     ActClass::Communication,
//!     "send_client_email",
//!     TargetScope::engagement("acme"),
//!     ContentHash::hash(b"draft body"),
//! );
//! assert!(request.validate().is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod request;
mod types;
mod verdict;

pub use error::{CoreError, CoreResult};
pub use request::ActionRequest;
pub use types::{
    ActClass, Granularity, Principal, PrincipalId, RequestId, Role, SeedId, TargetScope, TicketId,
    Tier, Timestamp,
};
pub use verdict::{DecidedBy, ReasonCode, Verdict, VerdictOutcome};
