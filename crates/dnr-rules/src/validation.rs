//! Structural validation for rules

use crate::schema::{Rule, RuleActionType, RuleCondition};
use crate::{Error, Result};

impl Rule {
    /// Check the rule against the platform's structural constraints.
    ///
    /// Only shape is checked here; whether a regex is accepted by the
    /// platform is a question for a [`crate::RegexProbe`].
    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(Error::invalid_rule(self.id, "rule IDs start at 1"));
        }
        if self.priority == 0 {
            return Err(Error::invalid_rule(self.id, "priority must be at least 1"));
        }
        validate_condition(self, &self.condition)?;

        if self.action.kind == RuleActionType::Redirect {
            let has_target = self
                .action
                .redirect
                .as_ref()
                .is_some_and(|r| r.url.is_some() || r.extension_path.is_some());
            if !has_target {
                return Err(Error::invalid_rule(
                    self.id,
                    "redirect action requires a redirect target",
                ));
            }
        }
        Ok(())
    }
}

fn validate_condition(rule: &Rule, condition: &RuleCondition) -> Result<()> {
    if condition.url_filter.is_some() && condition.regex_filter.is_some() {
        return Err(Error::invalid_rule(
            rule.id,
            "urlFilter and regexFilter are mutually exclusive",
        ));
    }

    let domain_lists = [
        ("initiatorDomains", &condition.initiator_domains),
        ("excludedInitiatorDomains", &condition.excluded_initiator_domains),
        ("requestDomains", &condition.request_domains),
        ("excludedRequestDomains", &condition.excluded_request_domains),
    ];
    for (name, list) in domain_lists {
        if let Some(domains) = list {
            if domains.is_empty() {
                return Err(Error::invalid_rule(rule.id, format!("{name} is empty")));
            }
            if domains.iter().any(|d| d.is_empty()) {
                return Err(Error::invalid_rule(
                    rule.id,
                    format!("{name} contains an empty domain"),
                ));
            }
        }
    }

    if condition.resource_types.as_ref().is_some_and(Vec::is_empty) {
        return Err(Error::invalid_rule(rule.id, "resourceTypes is empty"));
    }
    Ok(())
}
