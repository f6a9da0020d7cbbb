//! Audit error types.

use thiserror::Error;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The signing keyring is unavailable; nothing may be appended.
    #[error("signing unavailable: {0}")]
    SigningUnavailable(String),

    /// Storage backend failure.
    #[error("audit storage error: {0}")]
    StorageError(String),

    /// Entry signature does not match its contents.
    #[error("invalid signature on entry {seq}")]
    InvalidSignature {
        /// Sequence number of the offending entry.
        seq: u64,
    },

    /// The requested range is empty or reversed.
    #[error("invalid range: {from}..={to}")]
    InvalidRange {
        /// Range start.
        from: u64,
        /// Range end.
        to: u64,
    },

    /// Entry body could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
