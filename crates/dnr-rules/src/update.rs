//! Bulk update requests for an installed rule table

use crate::schema::{Rule, RuleId};
use serde::{Deserialize, Serialize};

/// A single remove-then-add request.
///
/// Removals are applied before additions, so an ID may appear in both lists
/// to replace a rule in place. Adding an ID that is still installed after the
/// removals is a conflict and must be rejected by the rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    #[serde(default)]
    pub remove_rule_ids: Vec<RuleId>,
    #[serde(default)]
    pub add_rules: Vec<Rule>,
}

impl RuleUpdate {
    pub fn new(remove_rule_ids: Vec<RuleId>, add_rules: Vec<Rule>) -> Self {
        Self {
            remove_rule_ids,
            add_rules,
        }
    }

    /// An update that only adds rules
    pub fn add(add_rules: Vec<Rule>) -> Self {
        Self::new(Vec::new(), add_rules)
    }

    pub fn is_empty(&self) -> bool {
        self.remove_rule_ids.is_empty() && self.add_rules.is_empty()
    }
}
