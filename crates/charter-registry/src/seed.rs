//! Precedent seeds: reusable, previously approved rule outcomes.

use charter_core::{ActClass, ActionRequest, RequestId, SeedId, TargetScope, Tier, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What applying a seed does to a decision.
///
/// Only [`Clarify`](SeedEffect::Clarify) and [`AddGate`](SeedEffect::AddGate)
/// may ever be registered. The weakening effects exist as variants so a
/// registration attempt carrying one is rejected with a validation error
/// instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SeedEffect {
    /// Attach an interpretation note to the decision; changes nothing else.
    Clarify {
        /// The clarifying note.
        note: String,
    },
    /// Add a named gate the decision must also pass.
    AddGate {
        /// The gate identifier.
        gate: String,
    },
    /// Would weaken an approval requirement. Never registrable.
    ReduceApproval,
    /// Would widen what an approval covers. Never registrable.
    ExpandScope,
}

impl SeedEffect {
    /// Whether this effect may be registered.
    #[must_use]
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Clarify { .. } | Self::AddGate { .. })
    }

    /// The effect's wire name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clarify { .. } => "clarify",
            Self::AddGate { .. } => "add_gate",
            Self::ReduceApproval => "reduce_approval",
            Self::ExpandScope => "expand_scope",
        }
    }
}

impl fmt::Display for SeedEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Structured predicate over request fields.
///
/// A `None` field matches anything; a `Some` field must match exactly.
/// Specificity is the number of `Some` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCriteria {
    /// Required action type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    /// Required act class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_class: Option<ActClass>,
    /// Required target scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_scope: Option<TargetScope>,
    /// Required principal tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_tier: Option<Tier>,
}

impl MatchCriteria {
    /// How many fields this predicate constrains.
    #[must_use]
    pub fn specificity(&self) -> usize {
        usize::from(self.action_type.is_some())
            + usize::from(self.act_class.is_some())
            + usize::from(self.target_scope.is_some())
            + usize::from(self.principal_tier.is_some())
    }

    /// Whether a request satisfies every constrained field.
    ///
    /// `class` and `tier` come from the caller, not the request: the rule
    /// table's classification and the principal directory's tier are
    /// authoritative, so a mis-declared `act_class` on the request cannot
    /// dodge a class-constrained seed.
    #[must_use]
    pub fn matches(&self, request: &ActionRequest, class: ActClass, tier: Tier) -> bool {
        if let Some(action_type) = &self.action_type {
            if *action_type != request.action_type {
                return false;
            }
        }
        if let Some(act_class) = self.act_class {
            if act_class != class {
                return false;
            }
        }
        if let Some(target_scope) = &self.target_scope {
            if *target_scope != request.target_scope {
                return false;
            }
        }
        if let Some(required_tier) = self.principal_tier {
            if required_tier != tier {
                return false;
            }
        }
        true
    }
}

/// A registered precedent seed. Immutable after creation; superseding
/// creates a new seed with a back-reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedentSeed {
    /// Stable, human-assignable identifier.
    pub seed_id: SeedId,
    /// When this seed applies.
    pub match_criteria: MatchCriteria,
    /// What applying it does.
    pub effect: SeedEffect,
    /// The decided request this seed grew from.
    pub created_from_request_id: RequestId,
    /// The seed this one replaces, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<SeedId>,
    /// When the seed was registered.
    pub created_at: Timestamp,
}

impl PrecedentSeed {
    /// Create a seed from a decided request.
    #[must_use]
    pub fn new(
        seed_id: impl Into<SeedId>,
        match_criteria: MatchCriteria,
        effect: SeedEffect,
        created_from_request_id: RequestId,
    ) -> Self {
        Self {
            seed_id: seed_id.into(),
            match_criteria,
            effect,
            created_from_request_id,
            supersedes: None,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_crypto::ContentHash;

    fn request(action_type: &str, class: ActClass) -> ActionRequest {
        ActionRequest::new(
            "usr-1",
            class,
            action_type,
            TargetScope::engagement("acme"),
            ContentHash::hash(b"payload"),
        )
    }

    #[test]
    fn test_effect_whitelist() {
        assert!(SeedEffect::Clarify { note: "n".into() }.is_permitted());
        assert!(SeedEffect::AddGate { gate: "g".into() }.is_permitted());
        assert!(!SeedEffect::ReduceApproval.is_permitted());
        assert!(!SeedEffect::ExpandScope.is_permitted());
    }

    #[test]
    fn test_empty_criteria_matches_everything() {
        let criteria = MatchCriteria::default();
        assert_eq!(criteria.specificity(), 0);
        assert!(criteria.matches(
            &request("publish_post", ActClass::Artifact),
            ActClass::Artifact,
            Tier::Trial
        ));
    }

    #[test]
    fn test_constrained_fields_must_all_match() {
        let criteria = MatchCriteria {
            action_type: Some("publish_post".into()),
            act_class: Some(ActClass::Artifact),
            target_scope: None,
            principal_tier: Some(Tier::Trial),
        };
        assert_eq!(criteria.specificity(), 3);

        let req = request("publish_post", ActClass::Artifact);
        assert!(criteria.matches(&req, ActClass::Artifact, Tier::Trial));
        assert!(!criteria.matches(&req, ActClass::Artifact, Tier::Paid));
        assert!(!criteria.matches(
            &request("send_email", ActClass::Artifact),
            ActClass::Artifact,
            Tier::Trial
        ));
    }

    #[test]
    fn test_class_constraint_uses_derived_class_not_declared() {
        let criteria = MatchCriteria {
            act_class: Some(ActClass::Execution),
            ..MatchCriteria::default()
        };

        // The request lies about its class; the derived class decides.
        let mislabeled = request("send_payment", ActClass::Artifact);
        assert!(criteria.matches(&mislabeled, ActClass::Execution, Tier::Paid));
        assert!(!criteria.matches(&mislabeled, ActClass::Artifact, Tier::Paid));
    }
}
