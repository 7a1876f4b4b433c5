//! Persisted version records
//!
//! After a successful synchronization the engine stores
//! `{etag, lookup}` under `declarative_net_request-<name>` in the settings
//! store. The record alone never proves the rules are installed; the
//! sentinel in the rule table is checked alongside it.

use crate::partition::ConfigName;
use crate::store::SettingsStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Prefix of every version record key
pub const SETTING_PREFIX: &str = "declarative_net_request-";

/// Settings key of `name`'s version record.
pub fn setting_key(name: ConfigName) -> String {
    format!("{SETTING_PREFIX}{name}")
}

/// Version tag and generator lookup of the last synchronized rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub etag: String,
    #[serde(default)]
    pub lookup: Value,
}

impl VersionRecord {
    pub fn new(etag: impl Into<String>, lookup: Value) -> Self {
        Self {
            etag: etag.into(),
            lookup,
        }
    }
}

/// What the settings store holds under a record key
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    Absent,
    Present(VersionRecord),
    /// A value that does not decode as a record
    Corrupt(String),
}

impl RecordState {
    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Present(record) => Some(&record.etag),
            _ => None,
        }
    }
}

/// Typed access to version records in a [`SettingsStore`]
#[derive(Clone)]
pub struct VersionTagStore {
    settings: Arc<dyn SettingsStore>,
}

impl VersionTagStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    pub async fn ready(&self) -> Result<()> {
        self.settings.ready().await
    }

    /// Read the raw state of `name`'s record.
    pub async fn read(&self, name: ConfigName) -> Result<RecordState> {
        let Some(value) = self.settings.get_setting(&setting_key(name)).await? else {
            return Ok(RecordState::Absent);
        };
        if value.is_null() {
            return Ok(RecordState::Absent);
        }
        Ok(match serde_json::from_value::<VersionRecord>(value) {
            Ok(record) => RecordState::Present(record),
            Err(e) => RecordState::Corrupt(e.to_string()),
        })
    }

    /// Read `name`'s record, treating an undecodable value as absent.
    pub async fn get(&self, name: ConfigName) -> Result<Option<VersionRecord>> {
        match self.read(name).await? {
            RecordState::Present(record) => Ok(Some(record)),
            RecordState::Absent => Ok(None),
            RecordState::Corrupt(reason) => {
                warn!(config = %name, %reason, "Ignoring undecodable version record");
                Ok(None)
            }
        }
    }

    pub async fn set(&self, name: ConfigName, record: &VersionRecord) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.settings.update_setting(&setting_key(name), value).await
    }
}
