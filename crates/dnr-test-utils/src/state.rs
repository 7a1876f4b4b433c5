//! [`TestStateDir`] builder for file-backed engine state.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary state directory laid out the way `dnr.toml` expects by
/// default: `settings.json`, `dynamic-rules.json` and `datasets/<name>.json`.
///
/// # Example
///
/// ```rust,no_run
/// use dnr_test_utils::{TestStateDir, tds};
///
/// let state = TestStateDir::new();
/// state.write_dataset("tds", &tds::sample_tracker_data());
/// state.write_config("manifest_version = 3\n");
/// assert!(state.dataset_path("tds").exists());
/// ```
pub struct TestStateDir {
    temp_dir: TempDir,
}

impl Default for TestStateDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStateDir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root().join("settings.json")
    }

    pub fn rules_path(&self) -> PathBuf {
        self.root().join("dynamic-rules.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("dnr.toml")
    }

    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.root().join("datasets").join(format!("{name}.json"))
    }

    /// Write `datasets/<name>.json`.
    ///
    /// # Panics
    /// Panics if the directory or file cannot be written.
    pub fn write_dataset(&self, name: &str, dataset: &Value) {
        let path = self.dataset_path(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_json::to_string_pretty(dataset).unwrap())
            .unwrap_or_else(|e| panic!("write_dataset: failed to write {}: {e}", path.display()));
    }

    /// Write `dnr.toml` with the given content.
    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).unwrap();
    }

    /// Delete the settings file, simulating a crash before the record write.
    pub fn remove_settings(&self) {
        if self.settings_path().exists() {
            fs::remove_file(self.settings_path()).unwrap();
        }
    }

    /// Delete the installed rules file, simulating rule loss.
    pub fn remove_rules(&self) {
        if self.rules_path().exists() {
            fs::remove_file(self.rules_path()).unwrap();
        }
    }

    /// Parse a JSON file relative to the root.
    ///
    /// # Panics
    /// Panics if the file cannot be read or parsed.
    pub fn read_json(&self, path: &str) -> Value {
        let full_path = self.root().join(path);
        let content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Invalid JSON in {}: {e}", full_path.display()))
    }
}
