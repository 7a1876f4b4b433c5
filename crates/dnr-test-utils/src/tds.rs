//! Tracker dataset fixtures.

use serde_json::{Value, json};
use std::collections::BTreeSet;

/// A small but realistic tracker dataset.
///
/// Contains blocking trackers sharing an owner, trackers with regex rules,
/// exceptions and a surrogate, a CNAME-cloaked domain, and one default-ignore
/// tracker without rules. That last tracker never produces a rule, so any
/// lookup generated from this dataset covers a strict subset of its
/// tracker domains.
pub fn sample_tracker_data() -> Value {
    json!({
        "trackers": {
            "adnetwork.example": {
                "domain": "adnetwork.example",
                "owner": { "name": "Ad Network Inc", "displayName": "Ad Network" },
                "default": "block",
                "categories": ["Advertising"],
                "prevalence": 0.42,
                "rules": [
                    { "rule": "adnetwork\\.example\\/consent\\/", "action": "ignore" },
                    {
                        "rule": "adnetwork\\.example\\/pixel",
                        "exceptions": { "domains": ["shop.example"], "types": ["image"] }
                    }
                ]
            },
            "adnetwork-static.example": {
                "domain": "adnetwork-static.example",
                "owner": { "name": "Ad Network Inc", "displayName": "Ad Network" },
                "default": "block",
                "prevalence": 0.2
            },
            "analytics.example": {
                "domain": "analytics.example",
                "owner": { "name": "Analytics LLC", "displayName": "Analytics" },
                "default": "block",
                "categories": ["Analytics"],
                "prevalence": 0.61,
                "rules": [
                    { "rule": "analytics\\.example\\/ga\\.js", "surrogate": "analytics.js" },
                    { "rule": "analytics\\.example\\/collect" }
                ]
            },
            "social.example": {
                "domain": "social.example",
                "owner": { "name": "Social Corp", "displayName": "Social" },
                "default": "ignore",
                "categories": ["Social Network"],
                "prevalence": 0.33,
                "rules": [
                    { "rule": "social\\.example\\/tr\\/" },
                    { "rule": "social\\.example\\/plugins\\/like", "action": "ignore" }
                ]
            },
            "fonts-cdn.example": {
                "domain": "fonts-cdn.example",
                "owner": { "name": "CDN Co", "displayName": "CDN" },
                "default": "ignore",
                "categories": ["CDN"],
                "prevalence": 0.8
            }
        },
        "entities": {
            "Ad Network Inc": {
                "domains": ["adnetwork.example", "adnetwork-static.example", "adnetwork-corp.example"],
                "displayName": "Ad Network",
                "prevalence": 0.5
            },
            "Analytics LLC": {
                "domains": ["analytics.example"],
                "displayName": "Analytics",
                "prevalence": 0.6
            },
            "Social Corp": {
                "domains": ["social.example", "social-cdn.example"],
                "displayName": "Social",
                "prevalence": 0.4
            },
            "CDN Co": {
                "domains": ["fonts-cdn.example"],
                "displayName": "CDN",
                "prevalence": 0.8
            }
        },
        "domains": {
            "adnetwork.example": "Ad Network Inc",
            "adnetwork-static.example": "Ad Network Inc",
            "adnetwork-corp.example": "Ad Network Inc",
            "analytics.example": "Analytics LLC",
            "social.example": "Social Corp",
            "social-cdn.example": "Social Corp",
            "fonts-cdn.example": "CDN Co"
        },
        "cnames": {
            "metrics.news.example": "analytics.example"
        }
    })
}

/// A dataset with no trackers at all.
pub fn empty_tracker_data() -> Value {
    json!({ "trackers": {}, "entities": {}, "domains": {} })
}

/// The tracker domains (the keys of `trackers`) in a dataset.
pub fn tracker_domains(dataset: &Value) -> BTreeSet<String> {
    dataset["trackers"]
        .as_object()
        .map(|trackers| trackers.keys().cloned().collect())
        .unwrap_or_default()
}
