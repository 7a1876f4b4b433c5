//! Tracker-blocking ruleset generator
//!
//! Generation happens in two passes over the trackers, both in domain order
//! so that the same dataset always yields the same rule IDs:
//!
//! 1. Base rules. Every default-`block` tracker is blocked by domain. Trackers
//!    owned by the same entity share one rule, since they also share the
//!    same first-party exclusions.
//! 2. Tracker rules. Each regex rule becomes its own rule scoped to the
//!    tracker's domains. Earlier rules get higher priorities because the
//!    first matching dataset rule wins. Exceptions become `allow` rules one
//!    priority step above the rule they exempt from.

use crate::dataset::{Tracker, TrackerAction, TrackerData, TrackerRule};
use crate::lookup::TrackerDomainLookup;
use async_trait::async_trait;
use dnr_rules::{
    GeneratedRuleset, RegexProbe, Redirect, ResourceType, Rule, RuleAction, RuleCondition,
    RuleId, RulesetGenerator,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Priority of the grouped per-entity block rules
pub const BASELINE_PRIORITY: u32 = 10_000;

/// Gap between consecutive tracker rules; the odd slot holds exceptions
pub const TRACKER_RULE_PRIORITY_STEP: u32 = 2;

const SURROGATE_PATH_PREFIX: &str = "/web_accessible_resources/";

/// Generates the tracker-blocking ruleset from a `tds` dataset
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerBlockingGenerator;

impl TrackerBlockingGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate from an already parsed dataset
    pub fn generate_from(
        &self,
        data: &TrackerData,
        probe: &dyn RegexProbe,
        first_rule_id: RuleId,
    ) -> dnr_rules::Result<GeneratedRuleset> {
        if first_rule_id == 0 {
            return Err(dnr_rules::Error::generation("rule IDs start at 1"));
        }
        let mut builder = RulesetBuilder::new(first_rule_id);

        let mut groups: BTreeMap<Vec<String>, Vec<&Tracker>> = BTreeMap::new();
        for tracker in data.trackers.values() {
            if tracker.default == TrackerAction::Block {
                groups
                    .entry(data.first_party_domains(tracker))
                    .or_default()
                    .push(tracker);
            }
        }
        for (first_party, trackers) in &groups {
            let tracker_domains: Vec<String> =
                trackers.iter().map(|t| t.domain.clone()).collect();
            let mut request_domains = tracker_domains.clone();
            for tracker in trackers {
                request_domains.extend(data.cloaked_domains(&tracker.domain));
            }

            let condition = RuleCondition {
                request_domains: Some(request_domains),
                excluded_initiator_domains: non_empty(first_party.clone()),
                ..Default::default()
            };
            builder.push(
                BASELINE_PRIORITY,
                condition,
                RuleAction::block(),
                &tracker_domains,
            )?;
        }

        for tracker in data.trackers.values() {
            self.push_tracker_rules(&mut builder, data, tracker, probe)?;
        }

        Ok(builder.finish())
    }

    fn push_tracker_rules(
        &self,
        builder: &mut RulesetBuilder,
        data: &TrackerData,
        tracker: &Tracker,
        probe: &dyn RegexProbe,
    ) -> dnr_rules::Result<()> {
        let tracker_domains = vec![tracker.domain.clone()];
        let mut request_domains = tracker_domains.clone();
        request_domains.extend(data.cloaked_domains(&tracker.domain));
        let first_party = data.first_party_domains(tracker);

        let count = tracker.rules.len() as u32;
        for (index, tracker_rule) in tracker.rules.iter().enumerate() {
            if !probe.is_regex_supported(&tracker_rule.rule) {
                debug!(
                    domain = %tracker.domain,
                    regex = %tracker_rule.rule,
                    "Skipping tracker rule with unsupported regex"
                );
                continue;
            }

            let priority = BASELINE_PRIORITY + TRACKER_RULE_PRIORITY_STEP * (count - index as u32);
            let action = rule_action(tracker_rule);
            let blocking = tracker_rule.effective_action() == TrackerAction::Block;

            let condition = RuleCondition {
                regex_filter: Some(tracker_rule.rule.clone()),
                request_domains: Some(request_domains.clone()),
                excluded_initiator_domains: if blocking {
                    non_empty(first_party.clone())
                } else {
                    None
                },
                resource_types: tracker_rule
                    .surrogate
                    .as_ref()
                    .filter(|_| blocking)
                    .map(|_| vec![ResourceType::Script]),
                ..Default::default()
            };
            builder.push(priority, condition, action, &tracker_domains)?;

            if !blocking {
                continue;
            }
            if let Some(exceptions) = tracker_rule.exceptions.as_ref().filter(|e| !e.is_empty()) {
                let resource_types: Vec<ResourceType> = exceptions
                    .types
                    .iter()
                    .filter_map(|t| ResourceType::from_dataset_name(t))
                    .collect();
                let condition = RuleCondition {
                    regex_filter: Some(tracker_rule.rule.clone()),
                    request_domains: Some(request_domains.clone()),
                    initiator_domains: non_empty(exceptions.domains.clone()),
                    resource_types: non_empty(resource_types),
                    ..Default::default()
                };
                builder.push(priority + 1, condition, RuleAction::allow(), &tracker_domains)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RulesetGenerator for TrackerBlockingGenerator {
    async fn generate(
        &self,
        dataset: &Value,
        probe: &dyn RegexProbe,
        first_rule_id: RuleId,
    ) -> dnr_rules::Result<GeneratedRuleset> {
        let data = TrackerData::from_value(dataset)?;
        self.generate_from(&data, probe, first_rule_id)
    }
}

fn rule_action(tracker_rule: &TrackerRule) -> RuleAction {
    match (tracker_rule.effective_action(), &tracker_rule.surrogate) {
        (TrackerAction::Ignore, _) => RuleAction::allow(),
        (TrackerAction::Block, Some(surrogate)) => RuleAction::redirect(Redirect {
            extension_path: Some(format!("{SURROGATE_PATH_PREFIX}{surrogate}")),
            url: None,
        }),
        (TrackerAction::Block, None) => RuleAction::block(),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

struct RulesetBuilder {
    next_id: RuleId,
    rules: Vec<Rule>,
    lookup: TrackerDomainLookup,
}

impl RulesetBuilder {
    fn new(first_rule_id: RuleId) -> Self {
        Self {
            next_id: first_rule_id,
            rules: Vec::new(),
            lookup: TrackerDomainLookup::new(),
        }
    }

    fn push(
        &mut self,
        priority: u32,
        condition: RuleCondition,
        action: RuleAction,
        tracker_domains: &[String],
    ) -> dnr_rules::Result<()> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| dnr_rules::Error::generation("rule ID space exhausted"))?;

        let rule = Rule::new(id, condition, action).with_priority(priority);
        rule.validate()?;
        self.rules.push(rule);
        self.lookup.insert(id, tracker_domains);
        Ok(())
    }

    fn finish(self) -> GeneratedRuleset {
        GeneratedRuleset::new(self.rules, self.lookup.to_value())
    }
}
