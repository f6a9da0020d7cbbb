//! Charter Engine - the policy decision point.
//!
//! Orchestrates one decision per action request: classification through the
//! compiled rule table, budget consumption, precedent matching against the
//! seed snapshot taken at receipt, and the mandatory approval checkpoint.
//! Every decided branch writes exactly one decision entry to the audit
//! chain before returning; an audit failure fails the decision.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod engine;
mod error;
mod rules;

pub use engine::{Engine, PrincipalDirectory, StaticPrincipalDirectory};
pub use error::{EngineError, EngineResult};
pub use rules::{ActionRule, RuleTable};
