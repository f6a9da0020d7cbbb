//! Identifier and principal types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub chrono::DateTime<chrono::Utc>);

impl Timestamp {
    /// Current time.
    #[must_use]
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Check if this timestamp is in the future.
    #[must_use]
    pub fn is_future(&self) -> bool {
        self.0 > chrono::Utc::now()
    }

    /// The UTC day this timestamp falls on (used for budget periods).
    #[must_use]
    pub fn utc_day(&self) -> chrono::NaiveDate {
        self.0.date_naive()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Unique identifier for an action request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// Unique identifier for an approval ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub Uuid);

impl TicketId {
    /// Create a new random ticket ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tkt:{}", self.0)
    }
}

/// Identifier for a precedent seed.
///
/// Stable and human-assignable (e.g. `"engagement-posts-gate"`), unlike the
/// random request and ticket IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedId(pub String);

impl SeedId {
    /// Wrap a seed identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seed:{}", self.0)
    }
}

impl From<&str> for SeedId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier for an authenticated principal.
///
/// Issued by the external identity provider; the engine treats it as an
/// opaque, stable string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    /// Wrap an identity-provider subject string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role held by a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits action requests.
    Operator,
    /// Resolves approval tickets for a scope.
    Governor,
    /// Automated agent acting on behalf of an engagement.
    ServiceAgent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator => write!(f, "operator"),
            Self::Governor => write!(f, "governor"),
            Self::ServiceAgent => write!(f, "service_agent"),
        }
    }
}

/// Billing tier of a principal. Determines budget caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Free trial — hard daily task ceiling.
    Trial,
    /// Paying customer.
    Paid,
    /// Internal/system principal.
    Internal,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trial => write!(f, "trial"),
            Self::Paid => write!(f, "paid"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// An authenticated actor (human or agent).
///
/// Immutable once issued for a session; the engine reads it, never writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier from the identity provider.
    pub principal_id: PrincipalId,
    /// Role held for this session.
    pub role: Role,
    /// Billing tier.
    pub tier: Tier,
}

impl Principal {
    /// Create a principal record.
    #[must_use]
    pub fn new(principal_id: impl Into<PrincipalId>, role: Role, tier: Tier) -> Self {
        Self {
            principal_id: principal_id.into(),
            role,
            tier,
        }
    }
}

impl From<String> for PrincipalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Classification of an action's effect boundary.
///
/// Determines the required approval strength: all three classes mandate
/// approval, but tickets are scoped to their class and never transfer
/// upward (an artifact ticket cannot authorize an execution boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActClass {
    /// Produces or publishes an artifact (post, document, file).
    Artifact,
    /// Sends a message to a human or external party.
    Communication,
    /// Performs an irreversible external effect (payment, order, deploy).
    Execution,
}

impl fmt::Display for ActClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact => write!(f, "artifact"),
            Self::Communication => write!(f, "communication"),
            Self::Execution => write!(f, "execution"),
        }
    }
}

/// What system or resource an action affects.
///
/// Routing key for approval: platform-scoped actions go to the platform
/// governor pool, engagement-scoped actions to that engagement's governor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope")]
pub enum TargetScope {
    /// Platform-wide resource.
    Platform,
    /// A specific engagement (client project, tenant).
    Engagement {
        /// Engagement identifier.
        engagement_id: String,
    },
}

impl TargetScope {
    /// Create an engagement scope.
    #[must_use]
    pub fn engagement(id: impl Into<String>) -> Self {
        Self::Engagement {
            engagement_id: id.into(),
        }
    }
}

/// How broadly one approval covers artifact-class actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One ticket per produced artifact.
    PerArtifact,
    /// One ticket per outbound message.
    PerSend,
    /// One ticket per action request.
    PerAction,
}

impl Granularity {
    /// The default granularity mandated for an act class.
    #[must_use]
    pub fn default_for(class: ActClass) -> Self {
        match class {
            ActClass::Artifact => Self::PerArtifact,
            ActClass::Communication => Self::PerSend,
            ActClass::Execution => Self::PerAction,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerArtifact => write!(f, "per_artifact"),
            Self::PerSend => write!(f, "per_send"),
            Self::PerAction => write!(f, "per_action"),
        }
    }
}

impl fmt::Display for TargetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => write!(f, "platform"),
            Self::Engagement { engagement_id } => write!(f, "engagement:{engagement_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
        assert_ne!(TicketId::new(), TicketId::new());
    }

    #[test]
    fn test_id_display_prefixes() {
        assert!(RequestId::new().to_string().starts_with("req:"));
        assert!(TicketId::new().to_string().starts_with("tkt:"));
    }

    #[test]
    fn test_timestamp_not_future() {
        assert!(!Timestamp::now().is_future());
    }

    #[test]
    fn test_target_scope_display() {
        assert_eq!(TargetScope::Platform.to_string(), "platform");
        assert_eq!(
            TargetScope::engagement("acme").to_string(),
            "engagement:acme"
        );
    }

    #[test]
    fn test_act_class_serde_snake_case() {
        let json = serde_json::to_string(&ActClass::Communication).unwrap();
        assert_eq!(json, "\"communication\"");
        let back: ActClass = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ActClass::Communication);
    }

    #[test]
    fn test_principal_roundtrip() {
        let p = Principal::new("usr-1", Role::Governor, Tier::Paid);
        let json = serde_json::to_string(&p).unwrap();
        let back: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
