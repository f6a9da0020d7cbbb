//! Audit storage backends.
//!
//! Durable storage is a collaborator, not part of this engine: backends
//! implement [`AuditStorage`] and the chain logic stays identical. The
//! in-memory backend ships here; anything durable lives with the deployment.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};

/// Append-only storage for audit entries.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Persist an entry. Must reject an entry whose `seq` is not the next
    /// position.
    async fn append(&self, entry: AuditEntry) -> AuditResult<()>;

    /// Fetch the entry at `seq`, if present.
    async fn get(&self, seq: u64) -> AuditResult<Option<AuditEntry>>;

    /// Fetch entries with `from <= seq <= to`, in order.
    async fn range(&self, from: u64, to: u64) -> AuditResult<Vec<AuditEntry>>;

    /// The most recently appended entry.
    async fn latest(&self) -> AuditResult<Option<AuditEntry>>;

    /// Number of stored entries.
    async fn count(&self) -> AuditResult<u64>;
}

/// In-memory audit storage.
#[derive(Default)]
pub struct MemoryAuditStorage {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, Vec<AuditEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!("audit storage lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl AuditStorage for MemoryAuditStorage {
    async fn append(&self, entry: AuditEntry) -> AuditResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("audit storage lock poisoned, recovering");
            poisoned.into_inner()
        });
        let expected = entries.len() as u64;
        if entry.seq != expected {
            return Err(AuditError::StorageError(format!(
                "out-of-order append: expected seq {expected}, got {}",
                entry.seq
            )));
        }
        entries.push(entry);
        Ok(())
    }

    async fn get(&self, seq: u64) -> AuditResult<Option<AuditEntry>> {
        let seq = usize::try_from(seq)
            .map_err(|_| AuditError::StorageError("seq out of range".into()))?;
        Ok(self.read_entries().get(seq).cloned())
    }

    async fn range(&self, from: u64, to: u64) -> AuditResult<Vec<AuditEntry>> {
        if from > to {
            return Err(AuditError::InvalidRange { from, to });
        }
        let entries = self.read_entries();
        let start = usize::try_from(from)
            .map_err(|_| AuditError::StorageError("seq out of range".into()))?;
        let end = usize::try_from(to)
            .map_err(|_| AuditError::StorageError("seq out of range".into()))?;
        Ok(entries
            .iter()
            .skip(start)
            .take(end.saturating_sub(start) + 1)
            .cloned()
            .collect())
    }

    async fn latest(&self) -> AuditResult<Option<AuditEntry>> {
        Ok(self.read_entries().last().cloned())
    }

    async fn count(&self) -> AuditResult<u64> {
        Ok(self.read_entries().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_core::{PrincipalId, RequestId};
    use charter_crypto::{ContentHash, KeyPair, SigningKeyring};

    use crate::entry::AuditEvent;

    fn entry(seq: u64, prev: ContentHash, ring: &SigningKeyring) -> AuditEntry {
        AuditEntry::seal(
            seq,
            prev,
            AuditEvent::SecurityAlert {
                request_id: RequestId::new(),
                principal_id: PrincipalId::new("usr-1"),
                violation_type: "exec_bypass".into(),
                details: "artifact ticket presented for execution".into(),
            },
            ring,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_append_and_fetch() {
        let ring = SigningKeyring::new(KeyPair::generate());
        let store = MemoryAuditStorage::new();

        let first = entry(0, ContentHash::zero(), &ring);
        let second = entry(1, first.entry_hash, &ring);
        store.append(first.clone()).await.unwrap();
        store.append(second).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.get(0).await.unwrap().unwrap().entry_hash, first.entry_hash);
        assert_eq!(store.latest().await.unwrap().unwrap().seq, 1);
        assert_eq!(store.range(0, 1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_out_of_order_append_rejected() {
        let ring = SigningKeyring::new(KeyPair::generate());
        let store = MemoryAuditStorage::new();

        let result = store.append(entry(5, ContentHash::zero(), &ring)).await;
        assert!(matches!(result, Err(AuditError::StorageError(_))));
    }

    #[tokio::test]
    async fn test_reversed_range_rejected() {
        let store = MemoryAuditStorage::new();
        let result = store.range(3, 1).await;
        assert!(matches!(result, Err(AuditError::InvalidRange { .. })));
    }
}
