//! Charter Config - configuration surface for the governance engine.
//!
//! Embedded defaults, an optional TOML override file, and a validation
//! pass. Nothing in the decision logic is hardcoded: per-tier budget caps,
//! approval granularity, ticket timeout, key rotation interval, and rule
//! table overrides all come from here.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use types::{
    ApprovalSection, AuditSection, BudgetSection, Config, GranularitySection, KeySection,
    RulesSection,
};
pub use validate::validate;
