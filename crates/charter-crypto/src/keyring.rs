//! Rotating signing keyring.
//!
//! The keyring holds exactly one active signing key and the public halves of
//! every key that has ever been active, indexed by [`KeyId`]. Rotation swaps
//! the active key but never forgets a public key, so audit entries signed
//! before a rotation always remain verifiable.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::{KeyId, KeyPair, PublicKey};
use crate::signature::Signature;

/// A signing keyring with one active key and a retained verification set.
pub struct SigningKeyring {
    current: KeyPair,
    retained: HashMap<KeyId, PublicKey>,
    path: Option<PathBuf>,
}

impl SigningKeyring {
    /// Create an in-memory keyring around an existing key pair.
    #[must_use]
    pub fn new(current: KeyPair) -> Self {
        let mut retained = HashMap::new();
        retained.insert(current.key_id(), current.export_public_key());
        Self {
            current,
            retained,
            path: None,
        }
    }

    /// Load the active key from `path`, or generate and save a new one.
    ///
    /// Rotations on a keyring created this way persist the new secret to the
    /// same path.
    ///
    /// # Errors
    ///
    /// Same as [`KeyPair::load_or_generate`].
    pub fn load_or_generate(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let current = KeyPair::load_or_generate(&path)?;
        let mut ring = Self::new(current);
        ring.path = Some(path);
        Ok(ring)
    }

    /// The ID of the active signing key.
    #[must_use]
    pub fn current_key_id(&self) -> KeyId {
        self.current.key_id()
    }

    /// Sign a message with the active key, returning the key ID that must be
    /// recorded alongside the signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> (KeyId, Signature) {
        (self.current.key_id(), self.current.sign(message))
    }

    /// Rotate the active signing key.
    ///
    /// The outgoing key's public half stays in the retained set. If the
    /// keyring is file-backed, the new secret replaces the old one on disk
    /// before the in-memory swap, so a crash mid-rotation loses no signing
    /// ability.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IoError`] if persisting the new key fails; the
    /// active key is unchanged in that case.
    pub fn rotate(&mut self) -> CryptoResult<KeyId> {
        let next = KeyPair::generate();
        if let Some(path) = &self.path {
            persist_secret(path, &next.secret_key_bytes())?;
        }
        self.retained.insert(next.key_id(), next.export_public_key());
        self.current = next;
        Ok(self.current.key_id())
    }

    /// Register an externally known public key (e.g. recovered from audit
    /// storage after a restart) so entries it signed can verify.
    pub fn import_public_key(&mut self, key: PublicKey) -> KeyId {
        let key_id = key.key_id();
        self.retained.insert(key_id, key);
        key_id
    }

    /// Look up a retained public key by ID.
    #[must_use]
    pub fn public_key(&self, key_id: &KeyId) -> Option<&PublicKey> {
        self.retained.get(key_id)
    }

    /// Verify a signature made under any retained key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownKeyId`] if the key ID is not retained,
    /// or [`CryptoError::SignatureVerificationFailed`] if the signature does
    /// not match.
    pub fn verify(&self, key_id: &KeyId, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        let key = self
            .retained
            .get(key_id)
            .ok_or_else(|| CryptoError::UnknownKeyId(hex::encode(key_id)))?;
        key.verify(message, signature)
    }

    /// Number of retained public keys (active key included).
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.retained.len()
    }

    /// All retained key IDs.
    #[must_use]
    pub fn key_ids(&self) -> Vec<KeyId> {
        self.retained.keys().copied().collect()
    }
}

impl std::fmt::Debug for SigningKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyring")
            .field("current_key_id", &hex::encode(self.current_key_id()))
            .field("retained", &self.retained.len())
            .finish_non_exhaustive()
    }
}

/// Replace the secret at `path` atomically: write a sibling temp file with
/// 0o600 permissions, then rename over the original.
fn persist_secret(path: &Path, secret: &[u8; 32]) -> CryptoResult<()> {
    let tmp = path.with_extension("tmp");

    #[cfg(unix)]
    let mut file = {
        use std::os::unix::fs::OpenOptionsExt;
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&tmp)
            .map_err(|e| CryptoError::IoError(e.to_string()))?
    };
    #[cfg(not(unix))]
    let mut file = std::fs::File::create(&tmp).map_err(|e| CryptoError::IoError(e.to_string()))?;

    file.write_all(secret)
        .map_err(|e| CryptoError::IoError(e.to_string()))?;
    file.sync_all()
        .map_err(|e| CryptoError::IoError(e.to_string()))?;
    drop(file);

    std::fs::rename(&tmp, path).map_err(|e| CryptoError::IoError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_records_current_key_id() {
        let ring = SigningKeyring::new(KeyPair::generate());
        let (key_id, sig) = ring.sign(b"entry hash");
        assert_eq!(key_id, ring.current_key_id());
        assert!(ring.verify(&key_id, b"entry hash", &sig).is_ok());
    }

    #[test]
    fn test_rotation_retains_old_key() {
        let mut ring = SigningKeyring::new(KeyPair::generate());
        let (old_id, old_sig) = ring.sign(b"before rotation");

        let new_id = ring.rotate().unwrap();
        assert_ne!(old_id, new_id);
        assert_eq!(ring.current_key_id(), new_id);
        assert_eq!(ring.key_count(), 2);

        // Entries signed under the old key still verify.
        assert!(ring.verify(&old_id, b"before rotation", &old_sig).is_ok());

        // New signatures carry the new key ID.
        let (key_id, sig) = ring.sign(b"after rotation");
        assert_eq!(key_id, new_id);
        assert!(ring.verify(&key_id, b"after rotation", &sig).is_ok());
    }

    #[test]
    fn test_unknown_key_id() {
        let ring = SigningKeyring::new(KeyPair::generate());
        let other = KeyPair::generate();
        let sig = other.sign(b"msg");
        let result = ring.verify(&other.key_id(), b"msg", &sig);
        assert!(matches!(result, Err(CryptoError::UnknownKeyId(_))));
    }

    #[test]
    fn test_import_public_key() {
        let mut ring = SigningKeyring::new(KeyPair::generate());
        let other = KeyPair::generate();
        let sig = other.sign(b"msg");

        let key_id = ring.import_public_key(other.export_public_key());
        assert!(ring.verify(&key_id, b"msg", &sig).is_ok());
    }

    #[test]
    fn test_file_backed_rotation_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signing.key");

        let mut ring = SigningKeyring::load_or_generate(&path).unwrap();
        let new_id = ring.rotate().unwrap();

        // Reloading picks up the rotated key.
        let reloaded = SigningKeyring::load_or_generate(&path).unwrap();
        assert_eq!(reloaded.current_key_id(), new_id);
    }

    #[cfg(unix)]
    #[test]
    fn test_rotation_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signing.key");

        let mut ring = SigningKeyring::load_or_generate(&path).unwrap();
        ring.rotate().unwrap();

        let perms = std::fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
