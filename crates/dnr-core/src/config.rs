//! Engine configuration parsed from `dnr.toml`
//!
//! ```toml
//! manifest_version = 3
//!
//! [state]
//! settings = "settings.json"
//! rules = "dynamic-rules.json"
//! datasets = "datasets"
//!
//! [sync]
//! untracked = "skip"
//! rule_limit = 30000
//! ```
//!
//! Every key is optional. Relative state paths resolve against a base
//! directory chosen by the caller, normally the directory holding the file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Platform manifest version of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ManifestVersion {
    V2,
    #[default]
    V3,
}

impl ManifestVersion {
    /// Whether the host exposes the declarative rule table
    pub fn uses_declarative_rules(self) -> bool {
        matches!(self, Self::V3)
    }
}

impl TryFrom<u8> for ManifestVersion {
    type Error = Error;

    fn try_from(version: u8) -> Result<Self> {
        match version {
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            _ => Err(Error::UnsupportedManifestVersion { version }),
        }
    }
}

impl From<ManifestVersion> for u8 {
    fn from(version: ManifestVersion) -> Self {
        match version {
            ManifestVersion::V2 => 2,
            ManifestVersion::V3 => 3,
        }
    }
}

/// What to do with a notification for a configuration without a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UntrackedPolicy {
    /// Ignore the notification
    #[default]
    Skip,
    /// Install only the sentinel and record the tag with a null lookup
    TrackTag,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.json")
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("dynamic-rules.json")
}

fn default_datasets_path() -> PathBuf {
    PathBuf::from("datasets")
}

/// Where file-backed state lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSection {
    #[serde(default = "default_settings_path")]
    pub settings: PathBuf,
    #[serde(default = "default_rules_path")]
    pub rules: PathBuf,
    /// Directory of `<name>.json` raw configuration datasets
    #[serde(default = "default_datasets_path")]
    pub datasets: PathBuf,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            settings: default_settings_path(),
            rules: default_rules_path(),
            datasets: default_datasets_path(),
        }
    }
}

impl StateSection {
    /// Resolve relative paths against `base`.
    pub fn resolve(&self, base: &Path) -> StateSection {
        let join = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                base.join(path)
            }
        };
        StateSection {
            settings: join(&self.settings),
            rules: join(&self.rules),
            datasets: join(&self.datasets),
        }
    }
}

/// Synchronization behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default)]
    pub untracked: UntrackedPolicy,
    /// Capacity of the file-backed rule table, unlimited when absent
    #[serde(default)]
    pub rule_limit: Option<usize>,
}

/// Parsed `dnr.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub manifest_version: ManifestVersion,
    #[serde(default)]
    pub state: StateSection,
    #[serde(default)]
    pub sync: SyncSection,
}

impl EngineConfig {
    /// Parse configuration from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use dnr_core::config::{EngineConfig, UntrackedPolicy};
    ///
    /// let config = EngineConfig::parse(r#"
    /// manifest_version = 3
    ///
    /// [sync]
    /// untracked = "track-tag"
    /// "#).unwrap();
    ///
    /// assert_eq!(config.sync.untracked, UntrackedPolicy::TrackTag);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file, resolving state paths against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::parse(&content).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.state = config.state.resolve(base);
        Ok(config)
    }
}
