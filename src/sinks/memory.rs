//! In-memory sink
//!
//! Collects delivered events for inspection. The test double, and a
//! convenient buffer for embeddings that drain events themselves.

use super::AnalyticsSink;
use crate::error::SinkError;
use crate::types::TrackedConversion;
use std::sync::Mutex;

/// Sink that appends every delivered event to an in-memory buffer
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TrackedConversion>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far
    pub fn events(&self) -> Vec<TrackedConversion> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalyticsSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn deliver(&self, event: &TrackedConversion) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|_| SinkError::Unavailable("buffer poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
