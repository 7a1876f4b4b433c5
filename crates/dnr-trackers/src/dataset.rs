//! Tracker dataset model
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "trackers": {
//!     "tracker.example": {
//!       "domain": "tracker.example",
//!       "owner": { "name": "Tracker Inc", "displayName": "Tracker" },
//!       "default": "block",
//!       "rules": [
//!         { "rule": "tracker\\.example\\/pixel", "action": "ignore" }
//!       ]
//!     }
//!   },
//!   "entities": {
//!     "Tracker Inc": { "domains": ["tracker.example"], "displayName": "Tracker" }
//!   },
//!   "domains": { "tracker.example": "Tracker Inc" }
//! }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The full tracker dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerData {
    /// Trackers keyed by their domain
    #[serde(default)]
    pub trackers: BTreeMap<String, Tracker>,
    /// Entities keyed by name
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,
    /// Domain to owning entity name
    #[serde(default)]
    pub domains: BTreeMap<String, String>,
    /// CNAME-cloaked domain to the tracker domain it resolves to
    #[serde(default)]
    pub cnames: BTreeMap<String, String>,
}

/// A single tracker entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub domain: String,
    #[serde(default)]
    pub owner: Option<Owner>,
    /// What happens to requests no rule matches
    #[serde(default)]
    pub default: TrackerAction,
    /// Ordered rules; the first matching rule wins
    #[serde(default)]
    pub rules: Vec<TrackerRule>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub prevalence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerAction {
    #[default]
    Block,
    Ignore,
}

/// A regex-scoped rule for one tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRule {
    /// Regex matched against the request URL
    pub rule: String,
    /// Overrides the tracker default when present
    #[serde(default)]
    pub action: Option<TrackerAction>,
    /// Surrogate script served instead of the blocked resource
    #[serde(default)]
    pub surrogate: Option<String>,
    #[serde(default)]
    pub exceptions: Option<TrackerException>,
}

impl TrackerRule {
    /// The action this rule applies, falling back to blocking
    pub fn effective_action(&self) -> TrackerAction {
        self.action.unwrap_or(TrackerAction::Block)
    }
}

/// Initiators and request types a tracker rule does not apply to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerException {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl TrackerException {
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.types.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub prevalence: f64,
}

impl TrackerData {
    /// Parse and sanity-check a raw dataset
    pub fn from_value(dataset: &Value) -> Result<Self> {
        let data: TrackerData = serde_json::from_value(dataset.clone())?;
        for (key, tracker) in &data.trackers {
            if key != &tracker.domain {
                return Err(Error::DomainMismatch {
                    key: key.clone(),
                    domain: tracker.domain.clone(),
                });
            }
        }
        Ok(data)
    }

    /// Domains belonging to the entity that owns `tracker`.
    ///
    /// Requests initiated from these domains are first-party for the tracker
    /// and are never blocked. The result is sorted and deduplicated.
    pub fn first_party_domains(&self, tracker: &Tracker) -> Vec<String> {
        let entity_name = tracker
            .owner
            .as_ref()
            .map(|o| o.name.as_str())
            .or_else(|| self.domains.get(&tracker.domain).map(String::as_str));

        let mut domains: Vec<String> = entity_name
            .and_then(|name| self.entities.get(name))
            .map(|entity| entity.domains.clone())
            .unwrap_or_default();
        domains.sort();
        domains.dedup();
        domains
    }

    /// CNAME-cloaked domains that resolve to `tracker_domain`
    pub fn cloaked_domains(&self, tracker_domain: &str) -> Vec<String> {
        self.cnames
            .iter()
            .filter(|(_, target)| target.as_str() == tracker_domain)
            .map(|(cloaked, _)| cloaked.clone())
            .collect()
    }
}
