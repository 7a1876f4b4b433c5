//! Ruleset generator contract
//!
//! A generator turns one raw configuration dataset into the rules that
//! enforce it, plus an opaque lookup table describing those rules. The
//! synchronization engine decides where the rules go; the generator only
//! promises to number them upwards from the first ID it is given.

use crate::Result;
use crate::schema::{Rule, RuleId};
use async_trait::async_trait;
use serde_json::Value;

/// Longest regex accepted by [`StandardRegexProbe`]
pub const MAX_REGEX_LENGTH: usize = 2048;

/// Capability probe asking whether the platform accepts a regex filter
pub trait RegexProbe: Send + Sync {
    fn is_regex_supported(&self, regex: &str) -> bool;
}

impl<F> RegexProbe for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_regex_supported(&self, regex: &str) -> bool {
        self(regex)
    }
}

/// Accepts any pattern the `regex` crate compiles, up to [`MAX_REGEX_LENGTH`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRegexProbe;

impl RegexProbe for StandardRegexProbe {
    fn is_regex_supported(&self, regex: &str) -> bool {
        regex.len() <= MAX_REGEX_LENGTH && regex::Regex::new(regex).is_ok()
    }
}

/// Output of a generator run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedRuleset {
    pub rules: Vec<Rule>,
    /// Implementation-defined side table, persisted with the version tag
    pub lookup: Value,
}

impl GeneratedRuleset {
    pub fn new(rules: Vec<Rule>, lookup: Value) -> Self {
        Self { rules, lookup }
    }

    /// An empty ruleset with a `null` lookup
    pub fn empty() -> Self {
        Self::new(Vec::new(), Value::Null)
    }

    /// Highest rule ID in the ruleset, if any
    pub fn max_rule_id(&self) -> Option<RuleId> {
        self.rules.iter().map(|r| r.id).max()
    }
}

/// Turns a raw configuration dataset into declarative rules
#[async_trait]
pub trait RulesetGenerator: Send + Sync {
    /// Generate rules for `dataset`, numbering them from `first_rule_id`.
    async fn generate(
        &self,
        dataset: &Value,
        probe: &dyn RegexProbe,
        first_rule_id: RuleId,
    ) -> Result<GeneratedRuleset>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RuleAction, RuleCondition};

    #[test]
    fn test_standard_probe_accepts_valid_regex() {
        assert!(StandardRegexProbe.is_regex_supported(r"tracker\.example/ads/.*"));
    }

    #[test]
    fn test_standard_probe_rejects_invalid_regex() {
        assert!(!StandardRegexProbe.is_regex_supported("(unclosed"));
    }

    #[test]
    fn test_standard_probe_rejects_oversized_regex() {
        let long = "a".repeat(MAX_REGEX_LENGTH + 1);
        assert!(!StandardRegexProbe.is_regex_supported(&long));
    }

    #[test]
    fn test_closure_probe() {
        let probe = |regex: &str| !regex.contains('|');
        assert!(probe.is_regex_supported("abc"));
        assert!(!probe.is_regex_supported("a|b"));
    }

    #[test]
    fn test_max_rule_id() {
        let rules = vec![
            Rule::new(4, RuleCondition::default(), RuleAction::block()),
            Rule::new(9, RuleCondition::default(), RuleAction::block()),
        ];
        assert_eq!(GeneratedRuleset::new(rules, Value::Null).max_rule_id(), Some(9));
        assert_eq!(GeneratedRuleset::empty().max_rule_id(), None);
    }
}
