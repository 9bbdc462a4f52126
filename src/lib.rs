//! CRO Engine - Embeddable conversion-rate-optimization core for marketing sites
//!
//! The engine turns raw navigation and form data into CRO decisions through
//! a deterministic pipeline: attribution extraction → lead scoring →
//! experiment assignment → conversion enrichment and dispatch.
//!
//! ## Modules
//!
//! - **Attribution**: Parse campaign parameters from navigation context
//! - **Scoring**: Map lead-form fields to a bounded sales-readiness score
//! - **Experiments**: Sticky, deterministic A/B variant assignment under
//!   targeting rules
//! - **Tracking**: Enrich conversion events and dispatch to analytics sinks

pub mod attribution;
pub mod config;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod scoring;
pub mod session;
pub mod sinks;
pub mod targeting;
pub mod tracker;
pub mod types;

pub use attribution::AttributionExtractor;
pub use config::{Experiment, ExperimentCatalog, ExperimentStatus, TargetingRule, Variant};
pub use engine::CroEngine;
pub use error::{ConfigError, SinkError};
pub use experiment::ExperimentAssigner;
pub use scoring::LeadScorer;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use sinks::{AnalyticsSink, JsonLinesSink, MemorySink};
pub use tracker::ConversionTracker;
pub use types::{Attribution, ConversionEvent, LeadScoreInputs, PageContext, TrackedConversion};

// Catalog schema export
pub use config::CATALOG_VERSION;

/// Engine version embedded in tracked payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for tracked payloads
pub const PRODUCER_NAME: &str = "cro-engine";
