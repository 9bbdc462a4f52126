//! Error types for the CRO engine

use thiserror::Error;

/// Errors raised while loading or validating experiment configuration.
///
/// These are surfaced eagerly at catalog-load time. Per-visitor operations
/// never return them; a visitor-facing path degrades silently instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported catalog version: {0}")]
    UnsupportedVersion(String),

    #[error("Duplicate experiment id: {0}")]
    DuplicateExperiment(String),

    #[error("Experiment {0} has no variants")]
    EmptyVariants(String),

    #[error("Experiment {experiment}: variant {variant} has negative weight {weight}")]
    NegativeWeight {
        experiment: String,
        variant: String,
        weight: f64,
    },

    #[error("Experiment {0}: variant weights sum to zero")]
    ZeroTotalWeight(String),

    #[error("Experiment {experiment}: unknown targeting subject {subject:?}")]
    UnknownRuleSubject {
        experiment: String,
        subject: String,
    },

    #[error("Experiment {experiment}: unknown targeting operator {operator:?}")]
    UnknownRuleOperator {
        experiment: String,
        operator: String,
    },

    #[error("Experiment {experiment}: invalid targeting regex {pattern:?}: {source}")]
    InvalidRuleRegex {
        experiment: String,
        pattern: String,
        source: regex::Error,
    },
}

/// Errors raised by an analytics sink while delivering an event.
///
/// The tracker swallows these per sink; they never reach the caller.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}
