//! Targeting rule evaluation
//!
//! Evaluates an experiment's targeting rules against the visitor's current
//! page and attribution context. Evaluation fails closed: a rule with an
//! unrecognized subject or operator, a malformed regex, or a context that
//! lacks the inspected field rejects the visitor instead of erroring.

use crate::config::{RuleOperator, RuleSubject, TargetingRule};
use crate::types::{Attribution, PageContext};
use tracing::warn;

/// Visitor context a targeting rule is evaluated against
#[derive(Debug, Clone, Default)]
pub struct TargetingContext {
    pub url: Option<String>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub utm_source: Option<String>,
    /// Site-defined custom attributes, matched via a rule's `key`
    pub custom: std::collections::HashMap<String, String>,
}

impl TargetingContext {
    /// Build a context from the current page and cached attribution
    pub fn from_page(page: Option<&PageContext>, attribution: Option<&Attribution>) -> Self {
        Self {
            url: page.map(|p| p.url.clone()),
            device: page.and_then(|p| p.device.clone()),
            location: page.and_then(|p| p.location.clone()),
            user_agent: page.and_then(|p| p.user_agent.clone()),
            utm_source: attribution.and_then(|a| a.source.clone()),
            custom: std::collections::HashMap::new(),
        }
    }

    fn subject_value(&self, rule: &TargetingRule) -> Option<&str> {
        match &rule.subject {
            RuleSubject::Url => self.url.as_deref(),
            RuleSubject::UtmSource => self.utm_source.as_deref(),
            RuleSubject::Device => self.device.as_deref(),
            RuleSubject::Location => self.location.as_deref(),
            RuleSubject::UserAgent => self.user_agent.as_deref(),
            RuleSubject::Custom => rule
                .key
                .as_deref()
                .and_then(|key| self.custom.get(key))
                .map(String::as_str),
            RuleSubject::Other(_) => None,
        }
    }
}

/// Evaluate a single rule against the context. Fail-closed on every
/// malformed or unmatchable input.
pub fn rule_matches(rule: &TargetingRule, context: &TargetingContext) -> bool {
    let actual = match context.subject_value(rule) {
        Some(actual) => actual,
        None => return false,
    };

    match &rule.operator {
        RuleOperator::Equals => actual == rule.value,
        RuleOperator::Contains => actual.contains(&rule.value),
        RuleOperator::StartsWith => actual.starts_with(&rule.value),
        RuleOperator::EndsWith => actual.ends_with(&rule.value),
        RuleOperator::Regex => match regex::Regex::new(&rule.value) {
            Ok(pattern) => pattern.is_match(actual),
            Err(error) => {
                warn!(pattern = %rule.value, %error, "targeting regex failed to compile");
                false
            }
        },
        RuleOperator::Other(operator) => {
            warn!(%operator, "unknown targeting operator");
            false
        }
    }
}

/// Evaluate all of an experiment's rules; all must pass
pub fn all_rules_match(rules: &[TargetingRule], context: &TargetingContext) -> bool {
    rules.iter().all(|rule| rule_matches(rule, context))
}
