//! SyncEngine implementation
//!
//! The SyncEngine keeps each configuration's installed rules in step with
//! the latest version of its dataset. On every update notification it
//! compares the notified tag with both the version record and the tag
//! sentinel, and only regenerates when either disagrees. Regeneration
//! replaces the whole partition in one bulk update and records the tag
//! afterwards, so an interrupted run is repaired by the next notification.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dnr_rules::{RegexProbe, Rule, RuleId, RuleUpdate, RulesetGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::UntrackedPolicy;
use crate::notify::UpdateListener;
use crate::partition::{ConfigName, RuleIdRange};
use crate::record::{RecordState, VersionRecord, VersionTagStore};
use crate::sentinel::{find_sentinel, sentinel_rule};
use crate::store::{ConfigurationCache, RuleTable, SettingsStore};
use crate::{Error, Result};

use super::check::{CheckReport, DriftItem, PartitionState};

/// What a notification led to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SyncOutcome {
    /// Record and sentinel already carry the tag; nothing was written
    AlreadyCurrent,
    /// The partition was regenerated
    Synchronized {
        /// Rules written, sentinel included
        rules_installed: usize,
    },
    /// No generator; only the sentinel and record were written
    TagRecorded,
    /// No generator and the untracked policy ignores the notification
    Skipped,
}

impl SyncOutcome {
    /// Whether the notification caused any writes
    pub fn wrote(&self) -> bool {
        matches!(self, Self::Synchronized { .. } | Self::TagRecorded)
    }
}

/// Options for synchronization
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Handling of configurations without a ruleset generator
    pub untracked: UntrackedPolicy,
}

/// Regex probe answered by the rule table
struct TableProbe<'a>(&'a dyn RuleTable);

impl RegexProbe for TableProbe<'_> {
    fn is_regex_supported(&self, regex: &str) -> bool {
        self.0.is_regex_supported(regex)
    }
}

/// Engine for synchronizing configuration datasets into the rule table
///
/// The engine itself holds no state between notifications: everything it
/// needs to decide whether work is due lives in the settings store and the
/// rule table.
pub struct SyncEngine {
    versions: VersionTagStore,
    cache: Arc<dyn ConfigurationCache>,
    rule_table: Arc<dyn RuleTable>,
    generators: HashMap<ConfigName, Arc<dyn RulesetGenerator>>,
    options: SyncOptions,
}

impl SyncEngine {
    /// Create an engine with no generators registered
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        cache: Arc<dyn ConfigurationCache>,
        rule_table: Arc<dyn RuleTable>,
    ) -> Self {
        Self {
            versions: VersionTagStore::new(settings),
            cache,
            rule_table,
            generators: HashMap::new(),
            options: SyncOptions::default(),
        }
    }

    /// Register the ruleset generator for `name`
    pub fn with_generator(mut self, name: ConfigName, generator: Arc<dyn RulesetGenerator>) -> Self {
        self.generators.insert(name, generator);
        self
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn has_generator(&self, name: ConfigName) -> bool {
        self.generators.contains_key(&name)
    }

    pub fn versions(&self) -> &VersionTagStore {
        &self.versions
    }

    pub fn rule_table(&self) -> &Arc<dyn RuleTable> {
        &self.rule_table
    }

    /// Bring `name`'s installed rules up to `etag`.
    ///
    /// Callers must not run two of these for the same configuration at
    /// once; [`crate::notify::UpdateNotifier`] serializes dispatch per
    /// configuration.
    ///
    /// # Errors
    ///
    /// Fails when the dataset is unavailable, the generator fails or
    /// numbers a rule outside the partition, or a store write fails. The
    /// version record is written last, so after any failure the next
    /// notification retries from scratch.
    #[instrument(skip(self, name), fields(config = %name))]
    pub async fn on_configuration_updated(&self, name: ConfigName, etag: &str) -> Result<SyncOutcome> {
        if etag.is_empty() {
            return Err(Error::EmptyEtag { name });
        }
        let range = name.rule_id_range();

        self.versions.ready().await?;
        let previous = self.versions.get(name).await?;

        if previous.as_ref().is_some_and(|record| record.etag == etag) {
            // The record may have outlived the rules it describes
            let installed = self.rule_table.dynamic_rules().await?;
            if find_sentinel(&installed, range) == Some(etag) {
                debug!("Installed rules already current");
                return Ok(SyncOutcome::AlreadyCurrent);
            }
            debug!("Version record is current but the sentinel is not");
        }

        self.cache.ready().await?;
        let Some(generator) = self.generators.get(&name) else {
            return self.record_untracked(name, range, etag).await;
        };

        let dataset = self.cache.get(name).await?;
        let probe = TableProbe(self.rule_table.as_ref());
        let generated = generator
            .generate(&dataset, &probe, range.first_data_id())
            .await
            .map_err(|source| Error::Generation { name, source })?;

        if let Some(rule) = generated
            .rules
            .iter()
            .find(|rule| rule.id == range.sentinel_id() || !range.contains(rule.id))
        {
            return Err(Error::RuleOutOfRange {
                name,
                id: rule.id,
                range,
            });
        }

        let rules_installed = self.replace_partition(range, generated.rules, etag).await?;
        self.versions
            .set(name, &VersionRecord::new(etag, generated.lookup))
            .await?;

        info!(
            previous = previous.as_ref().map(|r| r.etag.as_str()),
            rules = rules_installed,
            "Synchronized declarative rules"
        );
        Ok(SyncOutcome::Synchronized { rules_installed })
    }

    async fn record_untracked(&self, name: ConfigName, range: RuleIdRange, etag: &str) -> Result<SyncOutcome> {
        match self.options.untracked {
            UntrackedPolicy::Skip => {
                debug!("No ruleset generator registered, skipping");
                Ok(SyncOutcome::Skipped)
            }
            UntrackedPolicy::TrackTag => {
                self.replace_partition(range, Vec::new(), etag).await?;
                self.versions
                    .set(name, &VersionRecord::new(etag, Value::Null))
                    .await?;
                info!("Recorded version tag without rules");
                Ok(SyncOutcome::TagRecorded)
            }
        }
    }

    /// Replace everything in `range` with `rules` plus a sentinel for
    /// `etag`, returning the number of rules written.
    async fn replace_partition(&self, range: RuleIdRange, mut rules: Vec<Rule>, etag: &str) -> Result<usize> {
        let sentinel = sentinel_rule(range, etag);
        let remove_rule_ids: Vec<RuleId> = range.ids().collect();
        let count = rules.len() + 1;

        if self.rule_table.supports_atomic_update() {
            rules.push(sentinel);
            self.rule_table
                .update_dynamic_rules(RuleUpdate::new(remove_rule_ids, rules))
                .await?;
        } else {
            // Sentinel goes in last so a partial write never looks current
            self.rule_table
                .update_dynamic_rules(RuleUpdate::new(remove_rule_ids, rules))
                .await?;
            self.rule_table
                .update_dynamic_rules(RuleUpdate::add(vec![sentinel]))
                .await?;
        }
        Ok(count)
    }

    /// Check one configuration's record against its installed rules
    ///
    /// # Errors
    ///
    /// Returns an error if either store cannot be read. An undecodable
    /// record is reported as [`super::CheckStatus::Broken`] instead.
    pub async fn check(&self, name: ConfigName) -> Result<CheckReport> {
        self.versions.ready().await?;
        let installed = self.rule_table.dynamic_rules().await?;
        let record = self.versions.read(name).await?;
        Ok(self.check_partition(name, &record, &installed))
    }

    /// Check every configuration and look for rules no partition owns
    pub async fn check_all(&self) -> Result<CheckReport> {
        self.versions.ready().await?;
        let installed = self.rule_table.dynamic_rules().await?;

        let mut report = CheckReport::healthy();
        for name in ConfigName::ALL {
            let record = self.versions.read(name).await?;
            report = report.merge(self.check_partition(name, &record, &installed));
        }

        let orphans: Vec<DriftItem> = installed
            .iter()
            .filter(|rule| ConfigName::owning(rule.id).is_none())
            .map(|rule| {
                DriftItem::new(
                    None,
                    Some(rule.id),
                    format!("Rule {} is outside every configuration partition", rule.id),
                )
            })
            .collect();
        if !orphans.is_empty() {
            report = report.merge(CheckReport::with_drifted(orphans));
        }
        Ok(report)
    }

    fn check_partition(&self, name: ConfigName, record: &RecordState, installed: &[Rule]) -> CheckReport {
        let range = name.rule_id_range();
        let sentinel = find_sentinel(installed, range);
        let state = PartitionState {
            config: name,
            record_etag: record.etag().map(str::to_string),
            sentinel_etag: sentinel.map(str::to_string),
            installed_rules: installed.iter().filter(|r| range.contains(r.id)).count(),
        };
        let slot_taken = installed.iter().any(|r| r.id == range.sentinel_id());

        let report = match (record, sentinel) {
            (RecordState::Corrupt(reason), _) => {
                CheckReport::broken(format!("{name}: version record is unreadable: {reason}"))
            }
            (RecordState::Present(record), Some(tag)) if record.etag == tag => CheckReport::healthy(),
            (RecordState::Present(record), Some(tag)) => CheckReport::with_drifted(vec![DriftItem::new(
                Some(name),
                Some(range.sentinel_id()),
                format!("Record tag {} does not match sentinel tag {tag}", record.etag),
            )]),
            (_, None) if slot_taken => CheckReport::with_drifted(vec![DriftItem::new(
                Some(name),
                Some(range.sentinel_id()),
                format!("Rule {} occupies the sentinel slot", range.sentinel_id()),
            )]),
            (RecordState::Present(record), None) => CheckReport::with_missing(vec![DriftItem::new(
                Some(name),
                Some(range.sentinel_id()),
                format!("Sentinel missing, record claims {}", record.etag),
            )]),
            (RecordState::Absent, Some(tag)) => CheckReport::with_missing(vec![DriftItem::new(
                Some(name),
                None,
                format!("Version record missing, sentinel carries {tag}"),
            )]),
            (RecordState::Absent, None) if state.installed_rules > 0 => {
                CheckReport::with_drifted(vec![DriftItem::new(
                    Some(name),
                    None,
                    format!("{} rules installed without a sentinel or record", state.installed_rules),
                )])
            }
            (RecordState::Absent, None) => {
                if !self.has_generator(name) && self.options.untracked == UntrackedPolicy::Skip {
                    CheckReport::healthy().with_message(format!("{name}: not tracked"))
                } else {
                    CheckReport::with_missing(vec![DriftItem::new(Some(name), None, "Never synchronized")])
                }
            }
        };
        report.with_partition(state)
    }
}

#[async_trait]
impl UpdateListener for SyncEngine {
    async fn on_update(&self, name: ConfigName, etag: &str) -> Result<SyncOutcome> {
        self.on_configuration_updated(name, etag).await
    }
}
