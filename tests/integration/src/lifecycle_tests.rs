//! Host lifecycle integration tests
//!
//! Wire the engine to file-backed stores the way a host does at startup and
//! drive it through restarts, interrupted runs and lost state.

use async_trait::async_trait;
use dnr_core::store::{
    DirectoryConfigCache, FileRuleTable, FileSettingsStore, RuleTable, SettingsStore,
};
use dnr_core::{
    CheckStatus, ConfigName, ManifestVersion, SyncEngine, SyncOptions, SyncOutcome,
    UntrackedPolicy, UpdateNotifier, register_listeners,
};
use dnr_test_utils::{TestStateDir, tds};
use dnr_trackers::{TrackerBlockingGenerator, TrackerDomainLookup};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// A host process: stores opened from disk and listeners registered
struct Host {
    engine: Arc<SyncEngine>,
    notifier: UpdateNotifier,
}

impl Host {
    fn start(state: &TestStateDir, options: SyncOptions) -> Self {
        let settings: Arc<dyn SettingsStore> =
            Arc::new(FileSettingsStore::open(state.settings_path()).unwrap());
        Self::start_with(state, settings, options)
    }

    fn start_with(state: &TestStateDir, settings: Arc<dyn SettingsStore>, options: SyncOptions) -> Self {
        let rules = FileRuleTable::open(state.rules_path()).unwrap();
        let cache = DirectoryConfigCache::new(state.root().join("datasets"));
        let engine = Arc::new(
            SyncEngine::new(settings, Arc::new(cache), Arc::new(rules))
                .with_generator(ConfigName::Tds, Arc::new(TrackerBlockingGenerator::new()))
                .with_options(options),
        );
        let notifier = UpdateNotifier::new();
        register_listeners(&notifier, engine.clone(), ManifestVersion::V3);
        Self { engine, notifier }
    }

    async fn notify(&self, name: ConfigName, etag: &str) -> Vec<SyncOutcome> {
        let report = self.notifier.notify(name, etag).await;
        assert!(report.is_success(), "dispatch failed: {:?}", report.errors);
        report.outcomes
    }
}

/// File settings store that dies on its first write, like a crash between
/// installing rules and recording the tag
struct CrashOnFirstWrite {
    inner: FileSettingsStore,
    crashed: AtomicBool,
}

#[async_trait]
impl SettingsStore for CrashOnFirstWrite {
    async fn ready(&self) -> dnr_core::Result<()> {
        self.inner.ready().await
    }

    async fn get_setting(&self, key: &str) -> dnr_core::Result<Option<Value>> {
        self.inner.get_setting(key).await
    }

    async fn update_setting(&self, key: &str, value: Value) -> dnr_core::Result<()> {
        if !self.crashed.swap(true, Ordering::SeqCst) {
            return Err(dnr_core::Error::Settings {
                message: "process terminated".into(),
            });
        }
        self.inner.update_setting(key, value).await
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_interrupted_run_is_repaired_after_restart() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());

    let crashing = Arc::new(CrashOnFirstWrite {
        inner: FileSettingsStore::open(state.settings_path()).unwrap(),
        crashed: AtomicBool::new(false),
    });
    let host = Host::start_with(&state, crashing, SyncOptions::default());
    let report = host.notifier.notify(ConfigName::Tds, "v1").await;
    assert_eq!(report.errors.len(), 1);
    drop(host);

    // Rules and sentinel landed, the record did not
    let host = Host::start(&state, SyncOptions::default());
    let check = host.engine.check(ConfigName::Tds).await.unwrap();
    assert_eq!(check.status, CheckStatus::Missing);
    assert_eq!(check.partitions[0].sentinel_etag.as_deref(), Some("v1"));

    let outcomes = host.notify(ConfigName::Tds, "v1").await;
    assert!(matches!(outcomes[0], SyncOutcome::Synchronized { .. }));
    assert!(host.engine.check_all().await.unwrap().is_healthy());
}

#[tokio::test]
async fn test_restart_sequence_writes_only_when_needed() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());

    let host = Host::start(&state, SyncOptions::default());
    assert!(host.notify(ConfigName::Tds, "flib").await[0].wrote());

    let host = Host::start(&state, SyncOptions::default());
    assert_eq!(
        host.notify(ConfigName::Tds, "flib").await,
        vec![SyncOutcome::AlreadyCurrent]
    );
    assert!(host.notify(ConfigName::Tds, "flob").await[0].wrote());

    state.remove_settings();
    let host = Host::start(&state, SyncOptions::default());
    assert!(host.notify(ConfigName::Tds, "flob").await[0].wrote());

    state.remove_rules();
    let host = Host::start(&state, SyncOptions::default());
    assert!(host.notify(ConfigName::Tds, "flob").await[0].wrote());

    let host = Host::start(&state, SyncOptions::default());
    assert_eq!(
        host.notify(ConfigName::Tds, "flob").await,
        vec![SyncOutcome::AlreadyCurrent]
    );
}

#[tokio::test]
async fn test_configurations_keep_their_own_partitions() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());
    let options = SyncOptions {
        untracked: UntrackedPolicy::TrackTag,
    };

    let host = Host::start(&state, options.clone());
    host.notify(ConfigName::Config, "c1").await;
    host.notify(ConfigName::Tds, "t1").await;
    host.notify(ConfigName::Tds, "t2").await;
    host.notify(ConfigName::Config, "c2").await;

    let report = host.engine.check_all().await.unwrap();
    assert!(report.is_healthy(), "{report:?}");

    let rules = host.engine.rule_table().dynamic_rules().await.unwrap();
    let config_rules: Vec<_> = rules
        .iter()
        .filter(|r| ConfigName::owning(r.id) == Some(ConfigName::Config))
        .collect();
    assert_eq!(config_rules.len(), 1);
    assert_eq!(config_rules[0].condition.url_filter.as_deref(), Some("c2"));

    let settings = state.read_json("settings.json");
    assert_eq!(settings["declarative_net_request-tds"]["etag"], "t2");
    assert_eq!(settings["declarative_net_request-config"]["etag"], "c2");
    assert_eq!(settings["declarative_net_request-config"]["lookup"], Value::Null);
}

#[tokio::test]
async fn test_persisted_lookup_describes_installed_rules() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());

    let host = Host::start(&state, SyncOptions::default());
    host.notify(ConfigName::Tds, "v1").await;

    let settings = state.read_json("settings.json");
    let lookup =
        TrackerDomainLookup::from_value(&settings["declarative_net_request-tds"]["lookup"]).unwrap();
    let installed: BTreeSet<u32> = state
        .read_json("dynamic-rules.json")
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_u64().unwrap() as u32)
        .collect();

    assert!(!lookup.is_empty());
    for id in lookup.rule_ids() {
        assert!(installed.contains(&id), "lookup names uninstalled rule {id}");
    }
    assert!(!lookup.rule_ids().any(|id| id == 1), "sentinel is not in the lookup");

    let trackers = tds::tracker_domains(&tds::sample_tracker_data());
    for domain in lookup.domains() {
        assert!(trackers.contains(domain));
    }
}

#[tokio::test]
async fn test_dataset_update_replaces_rules_on_disk() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());
    let host = Host::start(&state, SyncOptions::default());
    host.notify(ConfigName::Tds, "v1").await;

    state.write_dataset("tds", &tds::empty_tracker_data());
    host.notify(ConfigName::Tds, "v2").await;

    let rules = state.read_json("dynamic-rules.json");
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["condition"]["urlFilter"], "v2");
}
