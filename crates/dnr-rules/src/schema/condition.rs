//! Rule match conditions

use serde::{Deserialize, Serialize};

/// Conditions a request must satisfy for a rule to apply.
///
/// Every field is optional; an absent field places no restriction on the
/// request. Empty lists are rejected by [`crate::validation`] because the
/// platform treats them as errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_url_filter_case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_initiator_domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_request_domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<ResourceType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_resource_types: Option<Vec<ResourceType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<DomainType>,
}

/// Request resource types recognised by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Object,
    Xmlhttprequest,
    Ping,
    CspReport,
    Media,
    Websocket,
    Other,
}

impl ResourceType {
    /// Map a tracker-dataset request type name to a platform resource type.
    ///
    /// The dataset uses `subdocument` where the platform says `sub_frame`.
    pub fn from_dataset_name(name: &str) -> Option<Self> {
        let kind = match name {
            "main_frame" => Self::MainFrame,
            "subdocument" | "sub_frame" => Self::SubFrame,
            "stylesheet" => Self::Stylesheet,
            "script" => Self::Script,
            "image" | "imageset" => Self::Image,
            "font" => Self::Font,
            "object" => Self::Object,
            "xmlhttprequest" => Self::Xmlhttprequest,
            "ping" | "beacon" => Self::Ping,
            "csp_report" => Self::CspReport,
            "media" => Self::Media,
            "websocket" => Self::Websocket,
            "other" => Self::Other,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainType {
    FirstParty,
    ThirdParty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_empty_condition_serializes_to_empty_object() {
        let value = serde_json::to_value(RuleCondition::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_condition_uses_camel_case() {
        let condition = RuleCondition {
            url_filter: Some("flib".into()),
            excluded_initiator_domains: Some(vec!["example.com".into()]),
            domain_type: Some(DomainType::ThirdParty),
            ..Default::default()
        };
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value["urlFilter"], "flib");
        assert_eq!(value["excludedInitiatorDomains"][0], "example.com");
        assert_eq!(value["domainType"], "thirdParty");
    }

    #[rstest]
    #[case("subdocument", Some(ResourceType::SubFrame))]
    #[case("script", Some(ResourceType::Script))]
    #[case("imageset", Some(ResourceType::Image))]
    #[case("xmlhttprequest", Some(ResourceType::Xmlhttprequest))]
    #[case("beacon", Some(ResourceType::Ping))]
    #[case("teleport", None)]
    fn test_resource_type_from_dataset_name(
        #[case] name: &str,
        #[case] expected: Option<ResourceType>,
    ) {
        assert_eq!(ResourceType::from_dataset_name(name), expected);
    }

    #[test]
    fn test_resource_type_wire_name() {
        assert_eq!(
            serde_json::to_value(ResourceType::SubFrame).unwrap(),
            json!("sub_frame")
        );
    }
}
