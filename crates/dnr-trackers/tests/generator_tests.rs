//! Generator contract tests against the shared tracker fixtures

use dnr_rules::{RegexProbe, RulesetGenerator, StandardRegexProbe};
use dnr_test_utils::tds;
use dnr_trackers::{TrackerBlockingGenerator, TrackerDomainLookup};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::BTreeSet;

#[rstest]
#[case::tds_partition(2)]
#[case::config_partition(10_002)]
#[case::arbitrary(500)]
#[tokio::test]
async fn test_generated_rules_are_valid_and_sequential(#[case] first_rule_id: u32) {
    let ruleset = TrackerBlockingGenerator::new()
        .generate(&tds::sample_tracker_data(), &StandardRegexProbe, first_rule_id)
        .await
        .unwrap();

    assert!(!ruleset.rules.is_empty());
    for (offset, rule) in ruleset.rules.iter().enumerate() {
        rule.validate().unwrap();
        assert_eq!(rule.id, first_rule_id + offset as u32);
    }
}

#[tokio::test]
async fn test_lookup_covers_strict_subset_of_tracker_domains() {
    let dataset = tds::sample_tracker_data();
    let ruleset = TrackerBlockingGenerator::new()
        .generate(&dataset, &StandardRegexProbe, 2)
        .await
        .unwrap();

    let lookup = TrackerDomainLookup::from_value(&ruleset.lookup).unwrap();
    let covered: BTreeSet<String> = lookup.domains().into_iter().map(String::from).collect();
    let trackers = tds::tracker_domains(&dataset);

    assert!(covered.is_subset(&trackers));
    assert!(covered.len() < trackers.len());

    let ids: BTreeSet<u32> = ruleset.rules.iter().map(|r| r.id).collect();
    assert!(lookup.rule_ids().all(|id| ids.contains(&id)));
}

#[tokio::test]
async fn test_same_dataset_generates_same_rules() {
    let dataset = tds::sample_tracker_data();
    let generator = TrackerBlockingGenerator::new();
    let first = generator.generate(&dataset, &StandardRegexProbe, 7).await.unwrap();
    let second = generator.generate(&dataset, &StandardRegexProbe, 7).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_probe_rejecting_all_regexes_drops_regex_rules() {
    let dataset = tds::sample_tracker_data();
    let generator = TrackerBlockingGenerator::new();
    let no_regex = |_: &str| false;

    let full = generator.generate(&dataset, &StandardRegexProbe, 2).await.unwrap();
    let reduced = generator
        .generate(&dataset, &no_regex as &dyn RegexProbe, 2)
        .await
        .unwrap();

    assert!(reduced.rules.len() < full.rules.len());
    assert!(reduced.rules.iter().all(|r| r.condition.regex_filter.is_none()));
}

#[tokio::test]
async fn test_empty_dataset_generates_nothing() {
    let ruleset = TrackerBlockingGenerator::new()
        .generate(&tds::empty_tracker_data(), &StandardRegexProbe, 2)
        .await
        .unwrap();
    assert!(ruleset.rules.is_empty());
    assert_eq!(ruleset.max_rule_id(), None);
}

#[tokio::test]
async fn test_malformed_dataset_is_a_generation_error() {
    let err = TrackerBlockingGenerator::new()
        .generate(&serde_json::json!({ "trackers": 5 }), &StandardRegexProbe, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, dnr_rules::Error::Generation { .. }));
}
