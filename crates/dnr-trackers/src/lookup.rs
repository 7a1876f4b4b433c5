//! Rule ID to tracker domain lookup
//!
//! Stored in the version record next to the tag so that other components can
//! explain which tracker a matched rule belongs to. On the wire it is a JSON
//! object keyed by rule ID whose values are comma-joined domains:
//! `{ "2": "ads.example,adsco.example" }`.

use crate::{Error, Result};
use dnr_rules::RuleId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackerDomainLookup {
    entries: BTreeMap<RuleId, String>,
}

impl TrackerDomainLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rule_id: RuleId, domains: &[String]) {
        self.entries.insert(rule_id, domains.join(","));
    }

    /// Domains covered by a rule
    pub fn get(&self, rule_id: RuleId) -> Option<Vec<&str>> {
        self.entries.get(&rule_id).map(|d| d.split(',').collect())
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.entries.keys().copied()
    }

    /// Every domain referenced by any rule
    pub fn domains(&self) -> BTreeSet<&str> {
        self.entries.values().flat_map(|d| d.split(',')).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Read a lookup back from a version record
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::new());
        }
        serde_json::from_value(value.clone()).map_err(|e| Error::InvalidLookup {
            message: e.to_string(),
        })
    }
}
