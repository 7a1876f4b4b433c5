//! In-memory stores
//!
//! Each store counts its writes so callers can observe exactly how much
//! work a synchronization did.

use super::{ConfigurationCache, ReadyGate, RuleTable, SettingsStore, apply_rule_update, lock};
use crate::notify::{DispatchReport, UpdateNotifier};
use crate::partition::ConfigName;
use crate::{Error, Result};
use async_trait::async_trait;
use dnr_rules::{Rule, RuleId, RuleUpdate};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Settings held in a map
#[derive(Debug)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, Value>>,
    gate: ReadyGate,
    writes: AtomicUsize,
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySettingsStore {
    /// An empty store that is already loaded.
    pub fn new() -> Self {
        Self::with_gate(ReadyGate::ready())
    }

    /// An empty store whose `ready()` suspends until [`Self::mark_ready`].
    pub fn pending() -> Self {
        Self::with_gate(ReadyGate::pending())
    }

    fn with_gate(gate: ReadyGate) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            gate,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn mark_ready(&self) {
        self.gate.open();
    }

    /// Number of `update_setting` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        lock(&self.values).get(key).cloned()
    }

    /// Seed a value without counting a write.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        lock(&self.values).insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        lock(&self.values).remove(key)
    }

    pub fn clear(&self) {
        lock(&self.values).clear();
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn ready(&self) -> Result<()> {
        self.gate.wait().await;
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.value(key))
    }

    async fn update_setting(&self, key: &str, value: Value) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }
}

/// Dynamic rule table held in a map
#[derive(Debug)]
pub struct MemoryRuleTable {
    rules: Mutex<BTreeMap<RuleId, Rule>>,
    rule_limit: Option<usize>,
    atomic: bool,
    writes: AtomicUsize,
    rejection: Mutex<Option<String>>,
}

impl Default for MemoryRuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRuleTable {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(BTreeMap::new()),
            rule_limit: None,
            atomic: true,
            writes: AtomicUsize::new(0),
            rejection: Mutex::new(None),
        }
    }

    pub fn with_rule_limit(mut self, limit: usize) -> Self {
        self.rule_limit = Some(limit);
        self
    }

    /// Report updates as non-atomic so callers split them.
    pub fn non_atomic(mut self) -> Self {
        self.atomic = false;
        self
    }

    /// Number of `update_dynamic_rules` calls so far, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Installed rules in ID order.
    pub fn rules(&self) -> Vec<Rule> {
        lock(&self.rules).values().cloned().collect()
    }

    pub fn rule(&self, id: RuleId) -> Option<Rule> {
        lock(&self.rules).get(&id).cloned()
    }

    /// Install a rule directly, bypassing validation and write counting.
    pub fn seed(&self, rule: Rule) {
        lock(&self.rules).insert(rule.id, rule);
    }

    /// Drop every installed rule, simulating loss of the table.
    pub fn clear(&self) {
        lock(&self.rules).clear();
    }

    /// Make the next update fail with `message`.
    pub fn reject_next_update(&self, message: impl Into<String>) {
        *lock(&self.rejection) = Some(message.into());
    }
}

#[async_trait]
impl RuleTable for MemoryRuleTable {
    async fn dynamic_rules(&self) -> Result<Vec<Rule>> {
        Ok(self.rules())
    }

    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.rejection).take() {
            return Err(Error::RuleTableRejected { message });
        }
        let mut rules = lock(&self.rules);
        *rules = apply_rule_update(&rules, update, self.rule_limit)?;
        Ok(())
    }

    fn supports_atomic_update(&self) -> bool {
        self.atomic
    }
}

/// Configuration cache fed by [`MemoryConfigCache::publish`]
pub struct MemoryConfigCache {
    datasets: Mutex<HashMap<ConfigName, Value>>,
    gate: ReadyGate,
    notifier: UpdateNotifier,
}

impl Default for MemoryConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConfigCache {
    pub fn new() -> Self {
        Self::with_gate(ReadyGate::ready())
    }

    /// A cache whose `ready()` suspends until [`Self::mark_ready`].
    pub fn pending() -> Self {
        Self::with_gate(ReadyGate::pending())
    }

    fn with_gate(gate: ReadyGate) -> Self {
        Self {
            datasets: Mutex::new(HashMap::new()),
            gate,
            notifier: UpdateNotifier::new(),
        }
    }

    pub fn mark_ready(&self) {
        self.gate.open();
    }

    /// Listener registry for update notifications.
    pub fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    /// Store `dataset` as the latest data for `name` without notifying.
    pub fn set(&self, name: ConfigName, dataset: Value) {
        lock(&self.datasets).insert(name, dataset);
    }

    pub fn remove(&self, name: ConfigName) {
        lock(&self.datasets).remove(&name);
    }

    /// Store `dataset` for `name` and notify listeners of `etag`.
    ///
    /// The dataset is swapped in only once earlier dispatches for `name`
    /// have finished, so every tag converges on its own data.
    pub async fn publish(&self, name: ConfigName, etag: &str, dataset: Value) -> DispatchReport {
        self.notifier
            .notify_with(name, etag, || self.set(name, dataset))
            .await
    }
}

#[async_trait]
impl ConfigurationCache for MemoryConfigCache {
    async fn ready(&self) -> Result<()> {
        self.gate.wait().await;
        Ok(())
    }

    async fn get(&self, name: ConfigName) -> Result<Value> {
        lock(&self.datasets)
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::unavailable(name, "no dataset has been delivered"))
    }
}
