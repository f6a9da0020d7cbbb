//! Prelude module - commonly used types for convenient import.
//!
//! Use `use charter_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identity
pub use crate::{Principal, PrincipalId, Role, Tier};

// Requests
pub use crate::{
    ActClass, ActionRequest, Granularity, RequestId, SeedId, TargetScope, TicketId, Timestamp,
};

// Verdicts
pub use crate::{DecidedBy, ReasonCode, Verdict, VerdictOutcome};
