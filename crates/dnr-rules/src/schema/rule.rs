//! Rule and action definitions

use super::condition::RuleCondition;
use serde::{Deserialize, Serialize};

/// Numeric rule identifier, unique across the whole installed rule table.
pub type RuleId = u32;

fn default_priority() -> u32 {
    1
}

/// A single declarative rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule identifier, must be at least 1
    pub id: RuleId,
    /// Higher priorities win when several rules match a request
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Which requests the rule matches
    pub condition: RuleCondition,
    /// What happens to a matched request
    pub action: RuleAction,
}

impl Rule {
    /// Create a rule with the default priority of 1
    pub fn new(id: RuleId, condition: RuleCondition, action: RuleAction) -> Self {
        Self {
            id,
            priority: default_priority(),
            condition,
            action,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

/// The action taken for a matching request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: RuleActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
}

impl RuleAction {
    pub fn block() -> Self {
        Self {
            kind: RuleActionType::Block,
            redirect: None,
        }
    }

    pub fn allow() -> Self {
        Self {
            kind: RuleActionType::Allow,
            redirect: None,
        }
    }

    pub fn redirect(redirect: Redirect) -> Self {
        Self {
            kind: RuleActionType::Redirect,
            redirect: Some(redirect),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleActionType {
    Block,
    Redirect,
    Allow,
    UpgradeScheme,
    ModifyHeaders,
    AllowAllRequests,
}

/// Redirect target, either an absolute URL or a path bundled with the extension
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_path: Option<String>,
}
