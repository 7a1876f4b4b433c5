//! Check types for SyncEngine validation
//!
//! Reports how the version records in the settings store line up with the
//! sentinels and rules installed in the rule table.

use crate::partition::ConfigName;
use dnr_rules::RuleId;
use serde::{Deserialize, Serialize};

/// Status of the synchronization check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Record and sentinel agree
    Healthy,
    /// A record or sentinel is absent; the next notification reinstalls
    Missing,
    /// Record and installed rules disagree
    Drifted,
    /// A version record cannot be decoded
    Broken,
}

/// A rule or record that is missing or disagrees with its counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftItem {
    /// Configuration the item belongs to, `None` for rules outside every
    /// partition
    pub config: Option<ConfigName>,
    /// Affected rule, if the item concerns one
    pub rule_id: Option<RuleId>,
    /// Human-readable description of the drift
    pub description: String,
}

impl DriftItem {
    pub fn new(
        config: Option<ConfigName>,
        rule_id: Option<RuleId>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            config,
            rule_id,
            description: description.into(),
        }
    }
}

/// What was observed for one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionState {
    pub config: ConfigName,
    /// Tag in the version record
    pub record_etag: Option<String>,
    /// Tag carried by the installed sentinel
    pub sentinel_etag: Option<String>,
    /// Rules installed in the partition, sentinel included
    pub installed_rules: usize,
}

/// Report from a synchronization check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Overall status of the check
    pub status: CheckStatus,
    /// Per-configuration observations
    pub partitions: Vec<PartitionState>,
    pub drifted: Vec<DriftItem>,
    pub missing: Vec<DriftItem>,
    pub messages: Vec<String>,
}

impl CheckReport {
    /// Create a healthy check report with no issues
    pub fn healthy() -> Self {
        Self {
            status: CheckStatus::Healthy,
            partitions: Vec::new(),
            drifted: Vec::new(),
            missing: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_missing(missing: Vec<DriftItem>) -> Self {
        Self {
            status: CheckStatus::Missing,
            missing,
            ..Self::healthy()
        }
    }

    pub fn with_drifted(drifted: Vec<DriftItem>) -> Self {
        Self {
            status: CheckStatus::Drifted,
            drifted,
            ..Self::healthy()
        }
    }

    /// Create a check report indicating a record is unreadable
    pub fn broken(message: String) -> Self {
        Self {
            status: CheckStatus::Broken,
            messages: vec![message],
            ..Self::healthy()
        }
    }

    pub fn with_partition(mut self, partition: PartitionState) -> Self {
        self.partitions.push(partition);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == CheckStatus::Healthy
    }

    /// Merge two check reports, combining their issues
    ///
    /// The resulting status is the "worst" of the two:
    /// Broken > Drifted > Missing > Healthy
    pub fn merge(mut self, other: CheckReport) -> Self {
        self.partitions.extend(other.partitions);
        self.drifted.extend(other.drifted);
        self.missing.extend(other.missing);
        self.messages.extend(other.messages);

        self.status = match (self.status, other.status) {
            (CheckStatus::Broken, _) | (_, CheckStatus::Broken) => CheckStatus::Broken,
            (CheckStatus::Drifted, _) | (_, CheckStatus::Drifted) => CheckStatus::Drifted,
            (CheckStatus::Missing, _) | (_, CheckStatus::Missing) => CheckStatus::Missing,
            (CheckStatus::Healthy, CheckStatus::Healthy) => CheckStatus::Healthy,
        };

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(description: &str) -> DriftItem {
        DriftItem::new(Some(ConfigName::Tds), Some(1), description)
    }

    #[test]
    fn test_healthy_report() {
        let report = CheckReport::healthy();
        assert!(report.is_healthy());
        assert!(report.drifted.is_empty());
        assert!(report.missing.is_empty());
        assert!(report.messages.is_empty());
    }

    #[test]
    fn test_merge_takes_worst_status() {
        let merged = CheckReport::with_missing(vec![item("Sentinel missing")])
            .merge(CheckReport::with_drifted(vec![item("Tag mismatch")]));
        assert_eq!(merged.status, CheckStatus::Drifted);
        assert_eq!(merged.missing.len(), 1);
        assert_eq!(merged.drifted.len(), 1);

        let merged = merged.merge(CheckReport::broken("unreadable".into()));
        assert_eq!(merged.status, CheckStatus::Broken);
        assert_eq!(merged.messages, vec!["unreadable".to_string()]);
    }

    #[test]
    fn test_merge_healthy_reports_keeps_partitions() {
        let state = |config| PartitionState {
            config,
            record_etag: Some("v1".into()),
            sentinel_etag: Some("v1".into()),
            installed_rules: 1,
        };
        let merged = CheckReport::healthy()
            .with_partition(state(ConfigName::Config))
            .merge(CheckReport::healthy().with_partition(state(ConfigName::Tds)));

        assert!(merged.is_healthy());
        assert_eq!(merged.partitions.len(), 2);
    }

    #[test]
    fn test_report_serializes_status_by_name() {
        let json = serde_json::to_value(CheckReport::with_missing(vec![item("x")])).unwrap();
        assert_eq!(json["status"], "Missing");
        assert_eq!(json["missing"][0]["config"], "tds");
    }
}
