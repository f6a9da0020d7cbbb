//! The classification rule table.
//!
//! Maps registered action types to their effect-boundary class and cost.
//! The table is compiled once at startup from built-in rules plus explicit
//! configuration overrides; classification is never inferred from free text
//! at runtime. An action type absent from the table is a validation error,
//! not a default.

use charter_core::ActClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classification and cost for one registered action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    /// Effect-boundary class of the action.
    pub act_class: ActClass,
    /// Budget cost of one consumed action, in cents.
    #[serde(default)]
    pub cost_cents: u64,
}

impl ActionRule {
    /// A zero-cost rule for the given class.
    #[must_use]
    pub const fn free(act_class: ActClass) -> Self {
        Self {
            act_class,
            cost_cents: 0,
        }
    }
}

/// The compiled rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, ActionRule>,
}

impl RuleTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules for the standard action vocabulary.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for action in ["draft_document", "publish_post", "generate_report"] {
            table.register(action, ActionRule::free(ActClass::Artifact));
        }
        for action in ["send_email", "send_message", "post_reply"] {
            table.register(action, ActionRule::free(ActClass::Communication));
        }
        for action in ["place_order", "send_payment", "deploy_release", "execute_trade"] {
            table.register(action, ActionRule::free(ActClass::Execution));
        }
        table
    }

    /// Register or replace a rule.
    pub fn register(&mut self, action_type: impl Into<String>, rule: ActionRule) {
        self.rules.insert(action_type.into(), rule);
    }

    /// Look up the rule for an action type.
    #[must_use]
    pub fn lookup(&self, action_type: &str) -> Option<&ActionRule> {
        self.rules.get(action_type)
    }

    /// Number of registered action types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_all_classes() {
        let table = RuleTable::with_defaults();
        assert_eq!(
            table.lookup("publish_post").unwrap().act_class,
            ActClass::Artifact
        );
        assert_eq!(
            table.lookup("send_email").unwrap().act_class,
            ActClass::Communication
        );
        assert_eq!(
            table.lookup("send_payment").unwrap().act_class,
            ActClass::Execution
        );
        assert!(table.lookup("transmute_lead").is_none());
    }

    #[test]
    fn test_override_replaces_builtin() {
        let mut table = RuleTable::with_defaults();
        table.register(
            "publish_post",
            ActionRule {
                act_class: ActClass::Communication,
                cost_cents: 25,
            },
        );
        let rule = table.lookup("publish_post").unwrap();
        assert_eq!(rule.act_class, ActClass::Communication);
        assert_eq!(rule.cost_cents, 25);
    }
}
