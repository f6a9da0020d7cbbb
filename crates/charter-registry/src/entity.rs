//! Versioned entity store.
//!
//! Leaf data model for governed entities (engagements, registered action
//! surfaces). Every change is an appended [`Amendment`]; history is never
//! edited in place.

use charter_core::{PrincipalId, Timestamp};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// In normal use.
    Active,
    /// Temporarily out of use; may return to active.
    Suspended,
    /// Permanently out of use.
    Retired,
}

/// One appended change to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendment {
    /// Monotonic revision, starting at 1 for the first amendment.
    pub revision: u64,
    /// What changed.
    pub change: String,
    /// Who amended.
    pub amended_by: PrincipalId,
    /// When.
    pub amended_at: Timestamp,
}

/// A governed entity with its full amendment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Stable entity identifier.
    pub entity_id: String,
    /// Entity kind, e.g. `"engagement"`.
    pub kind: String,
    /// Current lifecycle state.
    pub state: LifecycleState,
    /// When the entity was created.
    pub created_at: Timestamp,
    /// Append-only history.
    pub amendments: Vec<Amendment>,
}

impl EntityRecord {
    /// Current revision: 0 before any amendment.
    #[must_use]
    pub fn current_revision(&self) -> u64 {
        self.amendments.last().map_or(0, |a| a.revision)
    }
}

/// Concurrent store of entity records.
#[derive(Default)]
pub struct EntityStore {
    entities: DashMap<String, EntityRecord>,
}

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity in the `Active` state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateEntity`] if the ID is taken.
    pub fn create(&self, entity_id: impl Into<String>, kind: impl Into<String>) -> RegistryResult<()> {
        let entity_id = entity_id.into();
        if self.entities.contains_key(&entity_id) {
            return Err(RegistryError::DuplicateEntity(entity_id));
        }
        self.entities.insert(
            entity_id.clone(),
            EntityRecord {
                entity_id,
                kind: kind.into(),
                state: LifecycleState::Active,
                created_at: Timestamp::now(),
                amendments: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append an amendment, returning the new revision.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EntityNotFound`] if the entity is unknown.
    pub fn amend(
        &self,
        entity_id: &str,
        change: impl Into<String>,
        amended_by: PrincipalId,
    ) -> RegistryResult<u64> {
        let mut entry = self
            .entities
            .get_mut(entity_id)
            .ok_or_else(|| RegistryError::EntityNotFound(entity_id.to_string()))?;
        let revision = entry.current_revision() + 1;
        entry.amendments.push(Amendment {
            revision,
            change: change.into(),
            amended_by,
            amended_at: Timestamp::now(),
        });
        Ok(revision)
    }

    /// Transition an entity's lifecycle state, recorded as an amendment.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EntityNotFound`] if the entity is unknown.
    pub fn set_state(
        &self,
        entity_id: &str,
        state: LifecycleState,
        amended_by: PrincipalId,
    ) -> RegistryResult<u64> {
        let revision = self.amend(
            entity_id,
            format!("lifecycle -> {state:?}").to_lowercase(),
            amended_by,
        )?;
        if let Some(mut entry) = self.entities.get_mut(entity_id) {
            entry.state = state;
        }
        Ok(revision)
    }

    /// Fetch a copy of an entity record.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<EntityRecord> {
        self.entities.get(entity_id).map(|e| e.clone())
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_amend() {
        let store = EntityStore::new();
        store.create("acme", "engagement").unwrap();

        let r1 = store
            .amend("acme", "renamed contact", PrincipalId::new("gov-1"))
            .unwrap();
        let r2 = store
            .amend("acme", "scope widened", PrincipalId::new("gov-1"))
            .unwrap();
        assert_eq!((r1, r2), (1, 2));

        let record = store.get("acme").unwrap();
        assert_eq!(record.current_revision(), 2);
        assert_eq!(record.amendments.len(), 2);
        // History keeps every revision in order.
        assert_eq!(record.amendments[0].revision, 1);
        assert_eq!(record.amendments[0].change, "renamed contact");
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let store = EntityStore::new();
        store.create("acme", "engagement").unwrap();
        assert!(matches!(
            store.create("acme", "engagement"),
            Err(RegistryError::DuplicateEntity(_))
        ));
    }

    #[test]
    fn test_amend_unknown_entity() {
        let store = EntityStore::new();
        assert!(matches!(
            store.amend("ghost", "x", PrincipalId::new("gov-1")),
            Err(RegistryError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_state_transition_recorded() {
        let store = EntityStore::new();
        store.create("acme", "engagement").unwrap();
        store
            .set_state("acme", LifecycleState::Retired, PrincipalId::new("gov-1"))
            .unwrap();

        let record = store.get("acme").unwrap();
        assert_eq!(record.state, LifecycleState::Retired);
        assert_eq!(record.amendments.len(), 1);
        assert!(record.amendments[0].change.contains("retired"));
    }
}
