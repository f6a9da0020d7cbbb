//! Charter Audit - append-only signed audit chain.
//!
//! Every decided request, ticket transition, seed change, and security
//! alert is recorded as one chain entry: hash-linked to its predecessor,
//! signed by the engine keyring, and verifiable entry-by-entry so a tamper
//! is localized to a sequence number instead of invalidating the whole log.
//!
//! Entry hashes are computed over a canonical JSON encoding
//! ([`canonical::canonicalize`]) so the same body always hashes to the same
//! bytes, regardless of transport or storage encoding.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod canonical;

mod entry;
mod error;
mod log;
mod storage;

pub use entry::{AuditEntry, AuditEvent};
pub use error::{AuditError, AuditResult};
pub use log::{AuditLog, ChainVerification};
pub use storage::{AuditStorage, MemoryAuditStorage};
