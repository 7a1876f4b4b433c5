//! File-backed stores
//!
//! Settings and installed rules are JSON documents rewritten atomically on
//! every update: the new content goes to a locked temp file in the same
//! directory which is then renamed over the target. A crash leaves either
//! the old document or the new one, never a torn write.

use super::{ConfigurationCache, RuleTable, SettingsStore, apply_rule_update, lock};
use crate::partition::ConfigName;
use crate::{Error, Result};
use async_trait::async_trait;
use dnr_rules::{Rule, RuleId, RuleUpdate};
use fs2::FileExt;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Write `content` to `path` atomically, creating parent directories.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Read a JSON document under a shared lock, `None` if the file is absent.
fn read_locked(path: &Path) -> Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };
    file.lock_shared().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let mut content = String::new();
    (&file)
        .read_to_string(&mut content)
        .map_err(|e| Error::io(path, e))?;
    Ok(Some(content))
}

/// Settings persisted as one JSON object
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
}

impl FileSettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a
    /// JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match read_locked(&path)? {
            Some(content) => serde_json::from_str(&content)?,
            None => BTreeMap::new(),
        };
        debug!(path = %path.display(), settings = values.len(), "Opened settings store");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    async fn update_setting(&self, key: &str, value: Value) -> Result<()> {
        let mut values = lock(&self.values);
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        write_atomic(&self.path, &serde_json::to_vec_pretty(&next)?)?;
        *values = next;
        Ok(())
    }
}

/// Dynamic rule table persisted as a JSON array
#[derive(Debug)]
pub struct FileRuleTable {
    path: PathBuf,
    rules: Mutex<BTreeMap<RuleId, Rule>>,
    rule_limit: Option<usize>,
}

impl FileRuleTable {
    /// Open the table at `path`. A missing file is an empty table.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rules: Vec<Rule> = match read_locked(&path)? {
            Some(content) => serde_json::from_str(&content)?,
            None => Vec::new(),
        };
        debug!(path = %path.display(), rules = rules.len(), "Opened rule table");
        Ok(Self {
            path,
            rules: Mutex::new(rules.into_iter().map(|rule| (rule.id, rule)).collect()),
            rule_limit: None,
        })
    }

    pub fn with_rule_limit(mut self, limit: Option<usize>) -> Self {
        self.rule_limit = limit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleTable for FileRuleTable {
    async fn dynamic_rules(&self) -> Result<Vec<Rule>> {
        Ok(lock(&self.rules).values().cloned().collect())
    }

    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<()> {
        let mut rules = lock(&self.rules);
        let next = apply_rule_update(&rules, update, self.rule_limit)?;
        let ordered: Vec<&Rule> = next.values().collect();
        write_atomic(&self.path, &serde_json::to_vec_pretty(&ordered)?)?;
        *rules = next;
        Ok(())
    }
}

/// Datasets read from `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct DirectoryConfigCache {
    dir: PathBuf,
}

impl DirectoryConfigCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dataset_path(&self, name: ConfigName) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Content tag of `name`'s dataset file: the hex SHA-256 of its bytes.
    pub fn content_etag(&self, name: ConfigName) -> Result<String> {
        let path = self.dataset_path(name);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::unavailable(name, format!("{} not found", path.display())),
            _ => Error::io(&path, e),
        })?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

#[async_trait]
impl ConfigurationCache for DirectoryConfigCache {
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, name: ConfigName) -> Result<Value> {
        let path = self.dataset_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::unavailable(
                    name,
                    format!("{} not found", path.display()),
                ));
            }
            Err(e) => return Err(Error::io(&path, e)),
        };
        serde_json::from_str(&content)
            .map_err(|e| Error::unavailable(name, format!("{} is not valid JSON: {e}", path.display())))
    }
}
