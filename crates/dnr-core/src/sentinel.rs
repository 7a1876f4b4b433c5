//! The tag sentinel
//!
//! A no-op allow rule stored at the first ID of a partition. It carries the
//! version tag of the rules installed next to it in its `urlFilter` and can
//! never match a real request because its only request domain is under the
//! reserved `.invalid` TLD.

use crate::partition::RuleIdRange;
use dnr_rules::{Rule, RuleAction, RuleCondition};

/// Request domain that marks a rule as a tag sentinel
pub const SENTINEL_DOMAIN: &str = "etag.invalid";

/// Build the sentinel recording `etag` for `range`.
pub fn sentinel_rule(range: RuleIdRange, etag: &str) -> Rule {
    Rule::new(
        range.sentinel_id(),
        RuleCondition {
            url_filter: Some(etag.to_string()),
            request_domains: Some(vec![SENTINEL_DOMAIN.to_string()]),
            ..Default::default()
        },
        RuleAction::allow(),
    )
}

/// The tag carried by `rule`, if it has the sentinel shape.
pub fn decode_sentinel(rule: &Rule) -> Option<&str> {
    let domains = rule.condition.request_domains.as_deref()?;
    if domains.len() != 1 || domains[0] != SENTINEL_DOMAIN {
        return None;
    }
    rule.condition.url_filter.as_deref()
}

/// Find the tag recorded for `range` among installed rules.
///
/// Absent when no rule occupies the sentinel ID or when the rule there does
/// not have the sentinel shape.
pub fn find_sentinel(rules: &[Rule], range: RuleIdRange) -> Option<&str> {
    rules
        .iter()
        .find(|rule| rule.id == range.sentinel_id())
        .and_then(decode_sentinel)
}
