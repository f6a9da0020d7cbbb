//! The precedent seed registry.
//!
//! Mutations rebuild an immutable active-seed list behind an `Arc`, so a
//! decision in flight matches against the [`SeedSnapshot`] it took when the
//! request arrived; a supersession landing mid-decision does not shift the
//! ground under it.

use charter_core::{ActClass, ActionRequest, SeedId, Tier};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::error::{RegistryError, RegistryResult};
use crate::seed::PrecedentSeed;

/// An immutable view of the active seeds at one point in time.
#[derive(Debug, Clone)]
pub struct SeedSnapshot {
    seeds: Arc<Vec<Arc<PrecedentSeed>>>,
}

impl SeedSnapshot {
    /// Find the seed governing a request, if any.
    ///
    /// `class` is the classification derived from the rule table, not the
    /// request's declared class. Deterministic: the most specific matching
    /// criteria (by constrained field count) wins, and among equally
    /// specific matches the earliest registered seed wins.
    #[must_use]
    pub fn match_request(
        &self,
        request: &ActionRequest,
        class: ActClass,
        tier: Tier,
    ) -> Option<Arc<PrecedentSeed>> {
        let mut best: Option<&Arc<PrecedentSeed>> = None;
        for seed in self.seeds.iter() {
            if !seed.match_criteria.matches(request, class, tier) {
                continue;
            }
            let more_specific = match best {
                Some(current) => {
                    seed.match_criteria.specificity() > current.match_criteria.specificity()
                },
                None => true,
            };
            if more_specific {
                best = Some(seed);
            }
        }
        best.cloned()
    }

    /// Number of active seeds in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Whether the snapshot holds no seeds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

struct Inner {
    /// All seeds ever registered, in registration order. Never removed.
    all: Vec<Arc<PrecedentSeed>>,
    /// IDs retired by supersession.
    superseded: HashSet<SeedId>,
    /// Active seeds, rebuilt on every mutation.
    active: Arc<Vec<Arc<PrecedentSeed>>>,
}

impl Inner {
    fn rebuild_active(&mut self) {
        self.active = Arc::new(
            self.all
                .iter()
                .filter(|s| !self.superseded.contains(&s.seed_id))
                .cloned()
                .collect(),
        );
    }

    fn find(&self, seed_id: &SeedId) -> Option<&Arc<PrecedentSeed>> {
        self.all.iter().find(|s| s.seed_id == *seed_id)
    }
}

/// Registry of precedent seeds.
pub struct SeedRegistry {
    inner: RwLock<Inner>,
}

impl Default for SeedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                all: Vec::new(),
                superseded: HashSet::new(),
                active: Arc::new(Vec::new()),
            }),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("seed registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("seed registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Register a seed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DisallowedEffect`] unless the effect is
    /// `clarify` or `add_gate`, and [`RegistryError::DuplicateSeed`] if the
    /// ID is taken.
    pub fn register(&self, seed: PrecedentSeed) -> RegistryResult<SeedId> {
        if !seed.effect.is_permitted() {
            return Err(RegistryError::DisallowedEffect {
                effect: seed.effect.name().to_string(),
            });
        }

        let mut inner = self.write();
        if inner.find(&seed.seed_id).is_some() {
            return Err(RegistryError::DuplicateSeed(seed.seed_id));
        }

        let seed_id = seed.seed_id.clone();
        tracing::info!(seed = %seed_id, effect = %seed.effect, "seed registered");
        inner.all.push(Arc::new(seed));
        inner.rebuild_active();
        Ok(seed_id)
    }

    /// Replace a seed: registers `replacement` with a back-reference to
    /// `old_id` and retires the old seed from matching.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SeedNotFound`] if `old_id` is unknown,
    /// [`RegistryError::AlreadySuperseded`] if it was already replaced, and
    /// the same validation errors as [`register`](Self::register) for the
    /// replacement.
    pub fn supersede(
        &self,
        old_id: &SeedId,
        mut replacement: PrecedentSeed,
    ) -> RegistryResult<SeedId> {
        if !replacement.effect.is_permitted() {
            return Err(RegistryError::DisallowedEffect {
                effect: replacement.effect.name().to_string(),
            });
        }

        let mut inner = self.write();
        if inner.find(old_id).is_none() {
            return Err(RegistryError::SeedNotFound(old_id.clone()));
        }
        if inner.superseded.contains(old_id) {
            return Err(RegistryError::AlreadySuperseded(old_id.clone()));
        }
        if inner.find(&replacement.seed_id).is_some() {
            return Err(RegistryError::DuplicateSeed(replacement.seed_id));
        }

        replacement.supersedes = Some(old_id.clone());
        let new_id = replacement.seed_id.clone();
        tracing::info!(old = %old_id, new = %new_id, "seed superseded");

        inner.all.push(Arc::new(replacement));
        inner.superseded.insert(old_id.clone());
        inner.rebuild_active();
        Ok(new_id)
    }

    /// Look up a seed by ID, superseded ones included.
    #[must_use]
    pub fn get(&self, seed_id: &SeedId) -> Option<Arc<PrecedentSeed>> {
        self.read().find(seed_id).cloned()
    }

    /// Take an immutable snapshot of the active seeds.
    #[must_use]
    pub fn snapshot(&self) -> SeedSnapshot {
        SeedSnapshot {
            seeds: Arc::clone(&self.read().active),
        }
    }
}
