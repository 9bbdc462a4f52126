//! Engine facade
//!
//! This module provides the public API of the CRO engine: a stateful
//! processor owning the session store, the experiment catalog, and the
//! conversion tracker. The embedding UI feeds it navigation events, lead
//! submissions, and variant requests; everything downstream (attribution
//! policy, sticky assignment, enrichment, sink dispatch) happens here.

use crate::attribution::AttributionExtractor;
use crate::config::ExperimentCatalog;
use crate::experiment::ExperimentAssigner;
use crate::scoring::LeadScorer;
use crate::session::{MemorySessionStore, Session, SessionStore};
use crate::sinks::AnalyticsSink;
use crate::targeting::TargetingContext;
use crate::tracker::ConversionTracker;
use crate::types::{ConversionEvent, LeadScoreInputs, PageContext};

/// Stateful CRO engine for one visitor session
pub struct CroEngine {
    store: Box<dyn SessionStore>,
    catalog: ExperimentCatalog,
    tracker: ConversionTracker,
    current_page: Option<PageContext>,
    last_lead_score: Option<u8>,
}

impl Default for CroEngine {
    fn default() -> Self {
        Self::new(Box::new(MemorySessionStore::new()))
    }
}

impl CroEngine {
    /// Create an engine over the given session store with an empty catalog
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            catalog: ExperimentCatalog::default(),
            tracker: ConversionTracker::new(),
            current_page: None,
            last_lead_score: None,
        }
    }

    /// Create an engine with a validated experiment catalog
    pub fn with_catalog(store: Box<dyn SessionStore>, catalog: ExperimentCatalog) -> Self {
        Self {
            catalog,
            ..Self::new(store)
        }
    }

    /// Register an analytics sink
    pub fn add_sink(&mut self, sink: Box<dyn AnalyticsSink>) {
        self.tracker.add_sink(sink);
    }

    /// Replace the experiment catalog (e.g. after a config refresh)
    pub fn set_catalog(&mut self, catalog: ExperimentCatalog) {
        self.catalog = catalog;
    }

    pub fn catalog(&self) -> &ExperimentCatalog {
        &self.catalog
    }

    /// Current session state
    pub fn session(&mut self) -> &Session {
        self.store.session()
    }

    /// Record a page navigation.
    ///
    /// Touches the session, extracts attribution, and applies the
    /// last-touch cache policy: a navigation carrying any campaign signal
    /// replaces the cached attribution; a signal-free navigation leaves it
    /// untouched. (Policy choice — the alternative is first-touch, where
    /// the original entry wins for the life of the session.)
    pub fn record_navigation(&mut self, page: PageContext) {
        self.store.touch();

        let attribution = AttributionExtractor::extract_from_context(&page);
        let cache_empty = self.store.session().attribution.is_none();
        if attribution.has_campaign_signal() || cache_empty {
            self.store.set_attribution(attribution);
        }

        self.current_page = Some(page);
    }

    /// Score a lead without side effects. Safe to call on every keystroke
    /// during form fill.
    pub fn preview_score(&self, inputs: &LeadScoreInputs) -> u8 {
        LeadScorer::score(inputs)
    }

    /// Submit a lead: score it, remember the score for event enrichment,
    /// and track a `lead_submitted` conversion carrying the score.
    pub fn submit_lead(&mut self, inputs: &LeadScoreInputs) -> u8 {
        let score = LeadScorer::score(inputs);
        self.last_lead_score = Some(score);

        let event = ConversionEvent::new("lead_submitted")
            .with_category("lead")
            .with_value(f64::from(score));
        self.tracker.track(self.store.as_mut(), event, Some(score));
        score
    }

    /// Request the visitor's variant for a configured experiment.
    ///
    /// Returns `None` when the experiment is unknown, not running, or the
    /// visitor fails its targeting rules.
    pub fn assign(&mut self, experiment_id: &str) -> Option<String> {
        let experiment = self.catalog.get(experiment_id)?.clone();
        let context = TargetingContext::from_page(
            self.current_page.as_ref(),
            self.store.session().attribution.as_ref(),
        );
        ExperimentAssigner::assign(self.store.as_mut(), &experiment, &context)
    }

    /// Track a conversion event with current enrichment
    pub fn track(&mut self, event: ConversionEvent) {
        self.tracker
            .track(self.store.as_mut(), event, self.last_lead_score);
    }
}
