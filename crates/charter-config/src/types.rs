//! Configuration types.
//!
//! Every section and field carries a default, so an empty file (or no file
//! at all) yields a working configuration identical to the embedded
//! `defaults.toml`.

use charter_core::{ActClass, Granularity, Tier};
use charter_engine::{ActionRule, RuleTable};
use charter_guard::TierCaps;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Per-tier budget caps.
    #[serde(default)]
    pub budget: BudgetSection,
    /// Approval workflow settings.
    #[serde(default)]
    pub approval: ApprovalSection,
    /// Audit chain settings.
    #[serde(default)]
    pub audit: AuditSection,
    /// Signing key settings.
    #[serde(default)]
    pub keys: KeySection,
    /// Rule table overrides.
    #[serde(default)]
    pub rules: RulesSection,
}

impl Config {
    /// The per-tier caps map the budget guard consumes.
    #[must_use]
    pub fn caps(&self) -> HashMap<Tier, TierCaps> {
        HashMap::from([
            (Tier::Trial, self.budget.trial),
            (Tier::Paid, self.budget.paid),
            (Tier::Internal, self.budget.internal),
        ])
    }

    /// The compiled rule table: built-in vocabulary plus overrides.
    #[must_use]
    pub fn rule_table(&self) -> RuleTable {
        let mut table = RuleTable::with_defaults();
        for (action_type, rule) in &self.rules.overrides {
            table.register(action_type.clone(), *rule);
        }
        table
    }

    /// How long an open ticket waits before expiring.
    #[must_use]
    pub fn ticket_timeout(&self) -> Duration {
        Duration::from_secs(self.approval.ticket_timeout_secs)
    }

    /// How often the signing key rotates.
    #[must_use]
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.keys.rotation_interval_secs)
    }

    /// Configured approval granularity for an act class.
    #[must_use]
    pub fn granularity_for(&self, class: ActClass) -> Granularity {
        match class {
            ActClass::Artifact => self.approval.granularity.artifact,
            ActClass::Communication => self.approval.granularity.communication,
            ActClass::Execution => self.approval.granularity.execution,
        }
    }
}

/// Per-tier budget caps. Absent caps are uncapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetSection {
    /// Caps for trial principals.
    #[serde(default = "default_trial_caps")]
    pub trial: TierCaps,
    /// Caps for paid principals.
    #[serde(default = "default_paid_caps")]
    pub paid: TierCaps,
    /// Caps for internal principals.
    #[serde(default = "TierCaps::unlimited")]
    pub internal: TierCaps,
}

fn default_trial_caps() -> TierCaps {
    TierCaps {
        max_tasks_per_day: Some(10),
        max_spend_cents_per_day: Some(5_000),
        max_requests_per_minute: Some(30),
    }
}

fn default_paid_caps() -> TierCaps {
    TierCaps {
        max_tasks_per_day: None,
        max_spend_cents_per_day: Some(100_000),
        max_requests_per_minute: Some(120),
    }
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self {
            trial: default_trial_caps(),
            paid: default_paid_caps(),
            internal: TierCaps::unlimited(),
        }
    }
}

/// Approval workflow settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalSection {
    /// Seconds an open ticket waits for a governor before expiring.
    #[serde(default = "default_ticket_timeout_secs")]
    pub ticket_timeout_secs: u64,
    /// Default approval granularity per act class.
    #[serde(default)]
    pub granularity: GranularitySection,
}

fn default_ticket_timeout_secs() -> u64 {
    300
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            ticket_timeout_secs: default_ticket_timeout_secs(),
            granularity: GranularitySection::default(),
        }
    }
}

/// Default approval granularity per act class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GranularitySection {
    /// Granularity for artifact actions.
    #[serde(default = "artifact_granularity")]
    pub artifact: Granularity,
    /// Granularity for communication actions.
    #[serde(default = "communication_granularity")]
    pub communication: Granularity,
    /// Granularity for execution actions.
    #[serde(default = "execution_granularity")]
    pub execution: Granularity,
}

fn artifact_granularity() -> Granularity {
    Granularity::default_for(ActClass::Artifact)
}

fn communication_granularity() -> Granularity {
    Granularity::default_for(ActClass::Communication)
}

fn execution_granularity() -> Granularity {
    Granularity::default_for(ActClass::Execution)
}

impl Default for GranularitySection {
    fn default() -> Self {
        Self {
            artifact: artifact_granularity(),
            communication: communication_granularity(),
            execution: execution_granularity(),
        }
    }
}

/// Audit chain settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    /// Storage backend for chain entries. Only `"memory"` is built in;
    /// durable backends plug in through the storage trait.
    #[serde(default = "default_storage")]
    pub storage: String,
}

fn default_storage() -> String {
    "memory".to_owned()
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            storage: default_storage(),
        }
    }
}

/// Signing key settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySection {
    /// Where the signing key lives. `None` keeps an ephemeral in-memory key.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Seconds between signing-key rotations.
    #[serde(default = "default_rotation_interval_secs")]
    pub rotation_interval_secs: u64,
}

fn default_rotation_interval_secs() -> u64 {
    86_400
}

impl Default for KeySection {
    fn default() -> Self {
        Self {
            path: None,
            rotation_interval_secs: default_rotation_interval_secs(),
        }
    }
}

/// Rule table overrides keyed by action type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesSection {
    /// Action types added to, or replacing, the built-in vocabulary.
    #[serde(default)]
    pub overrides: HashMap<String, ActionRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_expectations() {
        let config = Config::default();
        assert_eq!(config.budget.trial.max_tasks_per_day, Some(10));
        assert_eq!(config.budget.internal, TierCaps::unlimited());
        assert_eq!(config.ticket_timeout(), Duration::from_secs(300));
        assert_eq!(
            config.granularity_for(ActClass::Communication),
            Granularity::PerSend
        );
    }

    #[test]
    fn test_rule_table_applies_overrides() {
        let mut config = Config::default();
        config.rules.overrides.insert(
            "mint_token".into(),
            ActionRule {
                act_class: ActClass::Execution,
                cost_cents: 500,
            },
        );
        let table = config.rule_table();
        assert_eq!(
            table.lookup("mint_token").unwrap().act_class,
            ActClass::Execution
        );
        // Built-ins survive alongside overrides.
        assert!(table.lookup("publish_post").is_some());
    }
}
