//! The append-only audit chain.
//!
//! All writes funnel through [`AuditLog::append`], which holds the chain
//! head under a mutex for the whole append: seal, persist, then advance.
//! A failed persist leaves the head untouched, so the chain never skips or
//! reuses a sequence number.

use std::sync::{Arc, RwLock};

use charter_crypto::{ContentHash, SigningKeyring};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::entry::{AuditEntry, AuditEvent};
use crate::error::{AuditError, AuditResult};
use crate::storage::AuditStorage;

/// Chain head state guarded by the writer mutex.
struct Head {
    next_seq: u64,
    prev_hash: ContentHash,
}

/// Result of a chain verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// True when every checked entry hashed, linked, and verified.
    pub valid: bool,
    /// Sequence number of the first broken entry, if any.
    pub first_break: Option<u64>,
    /// How many entries were checked.
    pub checked: u64,
}

/// The signed, hash-linked audit log.
pub struct AuditLog {
    storage: Arc<dyn AuditStorage>,
    keyring: Arc<RwLock<SigningKeyring>>,
    head: Mutex<Head>,
}

impl AuditLog {
    /// Open a log over existing storage, resuming from the stored head.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot report its latest
    /// entry.
    pub async fn open(
        storage: Arc<dyn AuditStorage>,
        keyring: Arc<RwLock<SigningKeyring>>,
    ) -> AuditResult<Self> {
        let head = match storage.latest().await? {
            Some(latest) => Head {
                next_seq: latest.seq + 1,
                prev_hash: latest.entry_hash,
            },
            None => Head {
                next_seq: 0,
                prev_hash: ContentHash::zero(),
            },
        };
        Ok(Self {
            storage,
            keyring,
            head: Mutex::new(head),
        })
    }

    /// Append an event as the next chain entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::SigningUnavailable`] if the keyring cannot be
    /// used, or a storage error if persisting fails. In both cases nothing
    /// is appended and the head does not move.
    pub async fn append(&self, event: AuditEvent) -> AuditResult<AuditEntry> {
        let mut head = self.head.lock().await;

        let entry = {
            // A keyring poisoned mid-rotation must not sign anything.
            let keyring = self
                .keyring
                .read()
                .map_err(|_| AuditError::SigningUnavailable("keyring lock poisoned".into()))?;
            AuditEntry::seal(head.next_seq, head.prev_hash, event, &keyring)?
        };

        self.storage.append(entry.clone()).await?;

        head.next_seq = entry.seq + 1;
        head.prev_hash = entry.entry_hash;

        tracing::debug!(seq = entry.seq, event = %entry.event.description(), "audit entry appended");
        Ok(entry)
    }

    /// Verify hashes, linkage, and signatures over `from..=to`.
    ///
    /// Verification stops advancing at the first broken entry and reports
    /// its sequence number; it never returns an error for a broken chain,
    /// only for storage failures.
    ///
    /// # Errors
    ///
    /// Returns a storage error if entries cannot be fetched.
    pub async fn verify_chain(&self, from: u64, to: u64) -> AuditResult<ChainVerification> {
        if from > to {
            return Err(AuditError::InvalidRange { from, to });
        }

        let entries = self.storage.range(from, to).await?;

        // Link the first checked entry to its predecessor (or genesis).
        let mut expected_prev = if from == 0 {
            ContentHash::zero()
        } else {
            match self.storage.get(from - 1).await? {
                Some(prev) => prev.entry_hash,
                None => {
                    return Ok(ChainVerification {
                        valid: false,
                        first_break: Some(from),
                        checked: 0,
                    });
                },
            }
        };

        let keyring = self
            .keyring
            .read()
            .map_err(|_| AuditError::SigningUnavailable("keyring lock poisoned".into()))?;

        let mut checked = 0u64;
        for (offset, entry) in entries.iter().enumerate() {
            let expected_seq = from + offset as u64;
            let intact = entry.seq == expected_seq
                && entry.prev_hash == expected_prev
                && entry.verify(&keyring).is_ok();
            if !intact {
                return Ok(ChainVerification {
                    valid: false,
                    first_break: Some(expected_seq),
                    checked,
                });
            }
            expected_prev = entry.entry_hash;
            checked += 1;
        }

        Ok(ChainVerification {
            valid: true,
            first_break: None,
            checked,
        })
    }

    /// Sequence number the next entry will take.
    pub async fn next_seq(&self) -> u64 {
        self.head.lock().await.next_seq
    }

    /// The storage backend this log writes to.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn AuditStorage> {
        &self.storage
    }
}
