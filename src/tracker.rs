//! Conversion tracking
//!
//! Validates and dispatches typed conversion events: enrich with the
//! session's attribution, assignments, and lead score; append to the
//! session log; then deliver to every registered sink independently.
//!
//! The local log is written before any dispatch is attempted, so it stays
//! authoritative even when every sink is unreachable. Tracking never
//! raises to its caller: invalid events are dropped with a warning, and a
//! failing sink neither blocks the remaining sinks nor surfaces an error.

use crate::session::SessionStore;
use crate::sinks::AnalyticsSink;
use crate::types::{ConversionEvent, TrackedConversion};
use chrono::Utc;
use tracing::warn;

/// Dispatches conversion events to zero or more analytics sinks
#[derive(Default)]
pub struct ConversionTracker {
    sinks: Vec<Box<dyn AnalyticsSink>>,
}

impl ConversionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink. Sinks are dispatched in registration order.
    pub fn add_sink(&mut self, sink: Box<dyn AnalyticsSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Track one conversion event. Fire-and-forget: the caller's flow does
    /// not depend on any sink's outcome.
    pub fn track(
        &self,
        store: &mut dyn SessionStore,
        event: ConversionEvent,
        lead_score: Option<u8>,
    ) {
        if event.event_name.trim().is_empty() {
            warn!("dropping conversion event with blank name");
            return;
        }

        let session = store.session();
        let tracked = TrackedConversion {
            timestamp: Utc::now(),
            attribution: session.attribution.clone(),
            assignments: session.experiment_assignments.clone(),
            lead_score,
            event,
        };

        // Local log first: authoritative even if every sink fails
        store.append_conversion(tracked.clone());

        for sink in &self.sinks {
            if let Err(error) = sink.deliver(&tracked) {
                warn!(sink = sink.name(), %error, "sink delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::session::MemorySessionStore;
    use crate::sinks::MemorySink;
    use crate::types::Attribution;
    use std::sync::Arc;

    /// Sink that always fails, for degraded-dispatch tests
    struct BrokenSink;

    impl AnalyticsSink for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }

        fn deliver(&self, _event: &TrackedConversion) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("always down".to_string()))
        }
    }

    /// Shared handle around [`MemorySink`] so tests can inspect delivery
    /// after handing ownership to the tracker
    struct SharedSink(Arc<MemorySink>);

    impl AnalyticsSink for SharedSink {
        fn name(&self) -> &str {
            "shared"
        }

        fn deliver(&self, event: &TrackedConversion) -> Result<(), SinkError> {
            self.0.deliver(event)
        }
    }

    #[test]
    fn blank_event_name_is_dropped() {
        let mut store = MemorySessionStore::new();
        let tracker = ConversionTracker::new();

        tracker.track(&mut store, ConversionEvent::new("   "), None);
        assert!(store.session().conversion_log.is_empty());
    }

    #[test]
    fn event_is_enriched_before_logging() {
        let mut store = MemorySessionStore::new();
        store.set_attribution(Attribution {
            source: Some("newsletter".to_string()),
            ..Attribution::default()
        });
        store.set_assignment("hero_copy", "benefit_led");

        let tracker = ConversionTracker::new();
        tracker.track(&mut store, ConversionEvent::new("signup"), Some(85));

        let log = &store.session().conversion_log;
        assert_eq!(log.len(), 1);
        let tracked = &log[0];
        assert_eq!(
            tracked.attribution.as_ref().unwrap().source.as_deref(),
            Some("newsletter")
        );
        assert_eq!(
            tracked.assignments.get("hero_copy"),
            Some(&"benefit_led".to_string())
        );
        assert_eq!(tracked.lead_score, Some(85));
    }

    #[test]
    fn failing_sink_does_not_block_others_or_the_caller() {
        let delivered = Arc::new(MemorySink::new());
        let mut tracker = ConversionTracker::new();
        tracker.add_sink(Box::new(BrokenSink));
        tracker.add_sink(Box::new(SharedSink(Arc::clone(&delivered))));

        let mut store = MemorySessionStore::new();
        tracker.track(&mut store, ConversionEvent::new("signup"), None);

        // The healthy sink still received the event
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered.events()[0].event.event_name, "signup");
    }

    #[test]
    fn log_is_written_even_when_all_sinks_fail() {
        let mut tracker = ConversionTracker::new();
        tracker.add_sink(Box::new(BrokenSink));
        tracker.add_sink(Box::new(BrokenSink));

        let mut store = MemorySessionStore::new();
        tracker.track(&mut store, ConversionEvent::new("signup"), None);

        assert_eq!(store.session().conversion_log.len(), 1);
    }

    #[test]
    fn log_order_matches_call_order() {
        let tracker = ConversionTracker::new();
        let mut store = MemorySessionStore::new();
        for name in ["first", "second", "third"] {
            tracker.track(&mut store, ConversionEvent::new(name), None);
        }

        let names: Vec<&str> = store
            .session()
            .conversion_log
            .iter()
            .map(|t| t.event.event_name.as_str())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }
}
