//! Host store abstractions
//!
//! The engine reaches the host through three traits:
//!
//! - [`SettingsStore`]: persisted key/value settings holding version records
//! - [`ConfigurationCache`]: the latest raw dataset of each configuration
//! - [`RuleTable`]: the platform's dynamic rule table
//!
//! In-memory implementations live in [`memory`] and file-backed ones in
//! [`file`].

pub mod file;
pub mod memory;

pub use file::{DirectoryConfigCache, FileRuleTable, FileSettingsStore};
pub use memory::{MemoryConfigCache, MemoryRuleTable, MemorySettingsStore};

use crate::partition::ConfigName;
use crate::{Error, Result};
use async_trait::async_trait;
use dnr_rules::{RegexProbe, Rule, RuleId, RuleUpdate, StandardRegexProbe};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Persisted key/value settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Suspend until the store has loaded.
    async fn ready(&self) -> Result<()>;

    async fn get_setting(&self, key: &str) -> Result<Option<Value>>;

    async fn update_setting(&self, key: &str, value: Value) -> Result<()>;
}

/// Latest raw dataset of each configuration
#[async_trait]
pub trait ConfigurationCache: Send + Sync {
    /// Suspend until the cache has loaded.
    async fn ready(&self) -> Result<()>;

    /// The dataset most recently delivered for `name`.
    async fn get(&self, name: ConfigName) -> Result<Value>;
}

/// The platform's dynamic rule table
#[async_trait]
pub trait RuleTable: Send + Sync {
    async fn dynamic_rules(&self) -> Result<Vec<Rule>>;

    /// Apply removals then additions in one step.
    ///
    /// Either the whole update takes effect or none of it does. Adding an ID
    /// that is still installed after the removals fails the update.
    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<()>;

    /// Whether the platform's regex engine accepts `regex`.
    fn is_regex_supported(&self, regex: &str) -> bool {
        StandardRegexProbe.is_regex_supported(regex)
    }

    /// Whether [`RuleTable::update_dynamic_rules`] applies an update
    /// atomically. Tables that cannot are written in two steps.
    fn supports_atomic_update(&self) -> bool {
        true
    }
}

/// Readiness signal for stores that load asynchronously
#[derive(Debug)]
pub struct ReadyGate {
    tx: watch::Sender<bool>,
}

impl ReadyGate {
    pub fn ready() -> Self {
        Self {
            tx: watch::Sender::new(true),
        }
    }

    pub fn pending() -> Self {
        Self {
            tx: watch::Sender::new(false),
        }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// Suspend until the gate is open.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            let open = *rx.borrow_and_update();
            if open || rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Compute the rule set that results from applying `update` to `installed`.
///
/// Every added rule is validated first. The limit, when set, bounds the size
/// of the resulting table. `installed` is left untouched on error.
pub fn apply_rule_update(
    installed: &BTreeMap<RuleId, Rule>,
    update: RuleUpdate,
    limit: Option<usize>,
) -> Result<BTreeMap<RuleId, Rule>> {
    for rule in &update.add_rules {
        rule.validate()?;
    }

    let mut next = installed.clone();
    for id in &update.remove_rule_ids {
        next.remove(id);
    }
    for rule in update.add_rules {
        if next.contains_key(&rule.id) {
            return Err(Error::DuplicateRuleId { id: rule.id });
        }
        next.insert(rule.id, rule);
    }

    if let Some(limit) = limit
        && next.len() > limit
    {
        return Err(Error::RuleLimitExceeded {
            limit,
            requested: next.len(),
        });
    }
    Ok(next)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
