//! Gateway error types.

use thiserror::Error;

/// Errors that can occur while running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The RPC server could not bind or start.
    #[error("gateway runtime error: {0}")]
    Runtime(String),

    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] charter_config::ConfigError),

    /// Signing key material could not be loaded or rotated.
    #[error(transparent)]
    Crypto(#[from] charter_crypto::CryptoError),

    /// The audit chain refused a write.
    #[error(transparent)]
    Audit(#[from] charter_audit::AuditError),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
