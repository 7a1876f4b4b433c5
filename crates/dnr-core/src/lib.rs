//! Rule-set synchronization engine
//!
//! Keeps the rules installed in a declarative filtering rule table in step
//! with the latest version of each configuration dataset, across restarts,
//! crashes and lost state:
//!
//! - **Partitions**: every configuration owns a disjoint block of rule IDs
//! - **Version records**: the tag of the last synchronized dataset, kept in
//!   the settings store
//! - **Tag sentinels**: a no-op rule carrying the same tag inside the rule
//!   table, so the table can prove what it holds
//! - **SyncEngine**: regenerates a partition only when record or sentinel
//!   disagree with a notified tag
//!
//! # Architecture
//!
//! ```text
//!                      dnr-cli
//!                         |
//!                      dnr-core
//!                         |
//!            +------------+------------+
//!            |                         |
//!        dnr-rules  <-------------  dnr-trackers
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dnr_core::{ConfigName, ManifestVersion, SyncEngine, register_listeners};
//! use dnr_core::store::{MemoryConfigCache, MemoryRuleTable, MemorySettingsStore};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let cache = Arc::new(MemoryConfigCache::new());
//! let table = Arc::new(MemoryRuleTable::new());
//! let engine = Arc::new(SyncEngine::new(
//!     Arc::new(MemorySettingsStore::new()),
//!     cache.clone(),
//!     table.clone(),
//! ));
//! register_listeners(cache.notifier(), engine, ManifestVersion::V3);
//!
//! // No generator is registered for "config", so nothing is installed
//! let report = cache.publish(ConfigName::Config, "v1", serde_json::json!({})).await;
//! assert!(report.is_success());
//! assert!(table.rules().is_empty());
//! # });
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod notify;
pub mod partition;
pub mod record;
pub mod sentinel;
pub mod store;
pub mod sync;

pub use bootstrap::register_listeners;
pub use config::{EngineConfig, ManifestVersion, UntrackedPolicy};
pub use error::{Error, Result};
pub use notify::{DispatchReport, UpdateListener, UpdateNotifier};
pub use partition::{CONFIG_RULE_ID_RANGE, ConfigName, RuleIdRange, TDS_RULE_ID_RANGE};
pub use record::{RecordState, VersionRecord, VersionTagStore, setting_key};
pub use sentinel::{SENTINEL_DOMAIN, sentinel_rule};
pub use sync::{
    CheckReport, CheckStatus, DriftItem, PartitionState, SyncEngine, SyncOptions, SyncOutcome,
};
