//! Engine context assembled from the state directory
//!
//! Loads `dnr.toml` (if present), opens the file-backed stores it points at
//! and wires a [`SyncEngine`] to an [`UpdateNotifier`] the same way a host
//! does at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dnr_core::config::StateSection;
use dnr_core::store::{DirectoryConfigCache, FileRuleTable, FileSettingsStore};
use dnr_core::{
    ConfigName, EngineConfig, SyncEngine, SyncOptions, UpdateNotifier, register_listeners,
};
use dnr_trackers::TrackerBlockingGenerator;

use crate::error::Result;

/// Stores, engine and notifier for one invocation
pub struct EngineContext {
    pub config: EngineConfig,
    pub cache: Arc<DirectoryConfigCache>,
    pub engine: Arc<SyncEngine>,
    pub notifier: UpdateNotifier,
    /// Listeners registered at startup; zero when declarative rules are off
    pub registrations: usize,
}

impl EngineContext {
    /// Load configuration and open the stores.
    ///
    /// An explicit `config_path` must exist. Otherwise `<state_dir>/dnr.toml`
    /// is used when present and defaults apply when it is not.
    pub fn open(state_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(state_dir, config_path)?;
        tracing::debug!(?config, "Loaded engine configuration");

        let state = &config.state;
        let settings = FileSettingsStore::open(&state.settings)?;
        let rules = FileRuleTable::open(&state.rules)?.with_rule_limit(config.sync.rule_limit);
        let cache = Arc::new(DirectoryConfigCache::new(&state.datasets));

        let engine = Arc::new(
            SyncEngine::new(Arc::new(settings), cache.clone(), Arc::new(rules))
                .with_generator(ConfigName::Tds, Arc::new(TrackerBlockingGenerator::new()))
                .with_options(SyncOptions {
                    untracked: config.sync.untracked,
                }),
        );

        let notifier = UpdateNotifier::new();
        let registrations = register_listeners(&notifier, engine.clone(), config.manifest_version);

        Ok(Self {
            config,
            cache,
            engine,
            notifier,
            registrations,
        })
    }

    pub fn state(&self) -> &StateSection {
        &self.config.state
    }
}

fn load_config(state_dir: &Path, config_path: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = config_path {
        return Ok(EngineConfig::load(path)?);
    }
    let default_path: PathBuf = state_dir.join("dnr.toml");
    if default_path.exists() {
        return Ok(EngineConfig::load(&default_path)?);
    }
    let mut config = EngineConfig::default();
    config.state = config.state.resolve(state_dir);
    Ok(config)
}
