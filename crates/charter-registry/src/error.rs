//! Registry error types.

use charter_core::SeedId;
use thiserror::Error;

/// Errors that can occur in the seed registry and entity store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The seed's effect is outside the permitted set.
    #[error("seed effect '{effect}' is not permitted: seeds may only clarify or add a gate")]
    DisallowedEffect {
        /// The rejected effect name.
        effect: String,
    },

    /// A seed with this ID already exists.
    #[error("seed {0} already registered")]
    DuplicateSeed(SeedId),

    /// No seed with this ID exists.
    #[error("seed {0} not found")]
    SeedNotFound(SeedId),

    /// The seed has already been superseded.
    #[error("seed {0} is already superseded")]
    AlreadySuperseded(SeedId),

    /// No entity with this ID exists.
    #[error("entity {0} not found")]
    EntityNotFound(String),

    /// An entity with this ID already exists.
    #[error("entity {0} already exists")]
    DuplicateEntity(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
