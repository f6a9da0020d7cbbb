//! Charter Crypto - Cryptographic primitives for the governance engine.
//!
//! This crate provides:
//! - Ed25519 key pairs with secure memory handling
//! - Signatures over audit entry hashes
//! - BLAKE3 content hashing for payload digests and chain linking
//! - A rotating [`SigningKeyring`] that never forgets a public key, so
//!   historical audit entries stay verifiable across rotations
//!
//! # Example
//!
//! ```
//! use charter_crypto::{ContentHash, KeyPair, SigningKeyring};
//!
//! let mut ring = SigningKeyring::new(KeyPair::generate());
//!
//! let entry_hash = ContentHash::hash(b"canonical entry body");
//! let (key_id, signature) = ring.sign(entry_hash.as_bytes());
//!
//! ring.rotate().unwrap();
//!
//! // Still verifies under the retired key.
//! assert!(ring.verify(&key_id, entry_hash.as_bytes(), &signature).is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod hash;
mod keypair;
mod keyring;
mod signature;

pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use keypair::{KeyId, KeyPair, PublicKey};
pub use keyring::SigningKeyring;
pub use signature::Signature;
