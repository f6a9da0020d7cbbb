//! Prelude module - commonly used types for convenient import.
//!
//! Use `use charter_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Key types
pub use crate::{KeyId, KeyPair, PublicKey};

// Signing
pub use crate::{Signature, SigningKeyring};

// Hashing
pub use crate::ContentHash;
