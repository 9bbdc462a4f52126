//! Core types for the CRO engine
//!
//! This module defines the data structures that flow through the engine:
//! navigation context, attribution records, lead-form inputs, and
//! conversion events in their raw and enriched forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Navigation context supplied by the embedding UI on every page entry.
///
/// Feeds both attribution extraction and experiment targeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    /// Full URL of the current navigation entry
    pub url: String,
    /// Document referrer, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Browser user-agent string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Device class reported by the UI (e.g. "mobile", "desktop")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Coarse visitor location (e.g. country code), if the UI knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl PageContext {
    /// Create a context carrying only a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referrer: None,
            user_agent: None,
            device: None,
            location: None,
        }
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }
}

/// Marketing attribution for a visitor session.
///
/// Every field is optional so consumers can distinguish "not provided"
/// from "provided but empty". Derived once per navigation entry and
/// immutable after creation; the session cache may replace it wholesale
/// under the last-touch policy, never edit it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Document referrer at the attributed entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// URL of the attributed entry page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
}

impl Attribution {
    /// Whether this record carries any campaign signal.
    ///
    /// Referrer and landing page alone do not count; they are recorded on
    /// every extraction and would make every navigation look attributed.
    pub fn has_campaign_signal(&self) -> bool {
        self.source.is_some()
            || self.medium.is_some()
            || self.campaign.is_some()
            || self.term.is_some()
            || self.content.is_some()
    }
}

/// Company headcount tier reported on a lead form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Solo,
    Small,
    Medium,
    Large,
    Enterprise,
    /// Unrecognized tier; contributes nothing to the score
    #[serde(untagged)]
    Other(String),
}

/// How soon the lead intends to act
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Exploring,
    NextQuarter,
    NextMonth,
    Immediate,
    #[serde(untagged)]
    Other(String),
}

/// Industry vertical reported on a lead form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Technology,
    Finance,
    Healthcare,
    Manufacturing,
    Retail,
    Education,
    Other,
    #[serde(untagged)]
    Unknown(String),
}

/// Fields collected from a lead form submission.
///
/// Ephemeral: constructed per submission, consumed by the scorer, never
/// persisted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadScoreInputs {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<CompanySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
    /// Free-form challenge tags; duplicates are tolerated here and
    /// deduplicated by the scorer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<String>,
}

impl LeadScoreInputs {
    /// Create inputs carrying only an email address
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            company_name: None,
            phone: None,
            company_size: None,
            urgency: None,
            industry: None,
            challenges: Vec::new(),
        }
    }
}

/// A conversion event as constructed by the caller.
///
/// Timestamp and enrichment are added at dispatch, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionEvent {
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Open string-keyed parameters forwarded to sinks as-is
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_parameters: HashMap<String, serde_json::Value>,
}

impl ConversionEvent {
    /// Create an event with just a name
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            event_category: None,
            event_label: None,
            value: None,
            custom_parameters: HashMap::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.event_category = Some(category.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.event_label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom_parameters.insert(key.into(), value);
        self
    }
}

/// A conversion event after enrichment, as appended to the session log
/// and delivered to sinks. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedConversion {
    /// The caller-supplied event
    #[serde(flatten)]
    pub event: ConversionEvent,
    /// Stamped at dispatch
    pub timestamp: DateTime<Utc>,
    /// Attribution snapshot at dispatch time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
    /// Experiment assignments active at dispatch time
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub assignments: HashMap<String, String>,
    /// Lead score, if one has been computed this session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_score: Option<u8>,
}
