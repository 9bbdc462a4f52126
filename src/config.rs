//! Experiment configuration
//!
//! Versioned `cro.experiments.v1` catalog: experiment definitions with
//! weighted variants and targeting rules, parsed from JSON and validated
//! eagerly. Configuration problems (no variants, negative weights, unknown
//! rule tags, malformed regexes) fail loudly here so that per-visitor
//! assignment never has to.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current catalog schema version
pub const CATALOG_VERSION: &str = "cro.experiments.v1";

/// Lifecycle state of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Draft,
    Running,
    Paused,
    Completed,
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStatus::Draft => "draft",
            ExperimentStatus::Running => "running",
            ExperimentStatus::Paused => "paused",
            ExperimentStatus::Completed => "completed",
        }
    }
}

/// One treatment arm of an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    /// Weight as a percentage share, 0-100. The set need not sum to 100;
    /// weights are normalized at assignment time.
    pub weight: f64,
}

/// What a targeting rule inspects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSubject {
    Url,
    UtmSource,
    Device,
    Location,
    UserAgent,
    Custom,
    /// Unrecognized subject; fails closed at evaluation
    #[serde(untagged)]
    Other(String),
}

/// How a targeting rule compares its subject to its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    /// Unrecognized operator; fails closed at evaluation
    #[serde(untagged)]
    Other(String),
}

/// A predicate gating experiment eligibility. All of an experiment's
/// rules must pass for a visitor to be eligible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingRule {
    pub subject: RuleSubject,
    pub operator: RuleOperator,
    pub value: String,
    /// Key into the context's custom map; only meaningful for
    /// `subject: custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// An A/B experiment definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targeting_rules: Vec<TargetingRule>,
    pub status: ExperimentStatus,
}

impl Experiment {
    /// Total of the variant weights (pre-normalization)
    pub fn total_weight(&self) -> f64 {
        self.variants.iter().map(|v| v.weight).sum()
    }
}

/// Raw catalog document as serialized
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogDocument {
    version: String,
    experiments: Vec<Experiment>,
}

/// Validated set of experiments, looked up by id at assignment time
#[derive(Debug, Clone, Default)]
pub struct ExperimentCatalog {
    experiments: HashMap<String, Experiment>,
}

impl ExperimentCatalog {
    /// Build a catalog from experiment definitions, validating each
    pub fn new(experiments: Vec<Experiment>) -> Result<Self, ConfigError> {
        let mut map = HashMap::with_capacity(experiments.len());
        for experiment in experiments {
            validate_experiment(&experiment)?;
            if map.contains_key(&experiment.id) {
                return Err(ConfigError::DuplicateExperiment(experiment.id));
            }
            map.insert(experiment.id.clone(), experiment);
        }
        Ok(Self { experiments: map })
    }

    /// Parse and validate a versioned catalog JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        if document.version != CATALOG_VERSION {
            return Err(ConfigError::UnsupportedVersion(document.version));
        }
        Self::new(document.experiments)
    }

    /// Serialize back to a versioned catalog document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut experiments: Vec<Experiment> = self.experiments.values().cloned().collect();
        experiments.sort_by(|a, b| a.id.cmp(&b.id));
        serde_json::to_string_pretty(&CatalogDocument {
            version: CATALOG_VERSION.to_string(),
            experiments,
        })
    }

    pub fn get(&self, experiment_id: &str) -> Option<&Experiment> {
        self.experiments.get(experiment_id)
    }

    pub fn experiments(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments.values()
    }

    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

fn validate_experiment(experiment: &Experiment) -> Result<(), ConfigError> {
    if experiment.variants.is_empty() {
        return Err(ConfigError::EmptyVariants(experiment.id.clone()));
    }

    for variant in &experiment.variants {
        if variant.weight < 0.0 {
            return Err(ConfigError::NegativeWeight {
                experiment: experiment.id.clone(),
                variant: variant.id.clone(),
                weight: variant.weight,
            });
        }
    }

    if experiment.total_weight() <= 0.0 {
        return Err(ConfigError::ZeroTotalWeight(experiment.id.clone()));
    }

    for rule in &experiment.targeting_rules {
        if let RuleSubject::Other(subject) = &rule.subject {
            return Err(ConfigError::UnknownRuleSubject {
                experiment: experiment.id.clone(),
                subject: subject.clone(),
            });
        }
        if let RuleOperator::Other(operator) = &rule.operator {
            return Err(ConfigError::UnknownRuleOperator {
                experiment: experiment.id.clone(),
                operator: operator.clone(),
            });
        }
        if rule.operator == RuleOperator::Regex {
            if let Err(source) = regex::Regex::new(&rule.value) {
                return Err(ConfigError::InvalidRuleRegex {
                    experiment: experiment.id.clone(),
                    pattern: rule.value.clone(),
                    source,
                });
            }
        }
    }

    Ok(())
}
