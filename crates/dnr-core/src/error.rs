//! Error types for dnr-core

use crate::partition::{ConfigName, RuleIdRange};
use dnr_rules::RuleId;
use std::path::PathBuf;

/// Result type for dnr-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dnr-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration name outside the closed set
    #[error("Unknown configuration: {name}")]
    UnknownConfiguration { name: String },

    /// Manifest version without a known synchronization mode
    #[error("Unsupported manifest version: {version}")]
    UnsupportedManifestVersion { version: u8 },

    /// Notification carried an empty version tag
    #[error("Empty version tag for {name}")]
    EmptyEtag { name: ConfigName },

    /// Raw configuration data could not be obtained
    #[error("Configuration {name} is unavailable: {reason}")]
    ConfigurationUnavailable { name: ConfigName, reason: String },

    /// The ruleset generator failed
    #[error("Ruleset generation failed for {name}: {source}")]
    Generation {
        name: ConfigName,
        #[source]
        source: dnr_rules::Error,
    },

    /// A generated rule would land outside its configuration's partition
    #[error("Generated rule {id} for {name} falls outside {range}")]
    RuleOutOfRange {
        name: ConfigName,
        id: RuleId,
        range: RuleIdRange,
    },

    /// An added rule collides with one that is still installed
    #[error("Duplicate rule ID: {id}")]
    DuplicateRuleId { id: RuleId },

    /// The update would exceed the rule table's capacity
    #[error("Rule limit exceeded: {requested} rules requested, limit is {limit}")]
    RuleLimitExceeded { limit: usize, requested: usize },

    /// The rule table refused the update for another reason
    #[error("Rule table rejected update: {message}")]
    RuleTableRejected { message: String },

    /// The settings store failed to read or persist a value
    #[error("Settings store error: {message}")]
    Settings { message: String },

    /// Engine configuration file could not be used
    #[error("Invalid engine configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    /// Rule validation error from dnr-rules
    #[error(transparent)]
    Rules(#[from] dnr_rules::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unavailable(name: ConfigName, reason: impl Into<String>) -> Self {
        Self::ConfigurationUnavailable {
            name,
            reason: reason.into(),
        }
    }
}
