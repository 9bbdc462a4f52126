//! Analytics sinks
//!
//! A sink is an opaque receiver of tracked conversions. The tracker makes
//! no assumptions about a sink's delivery guarantees: each dispatch is
//! best-effort and at-most-once, and a sink that needs network I/O owns
//! its own buffering behind the `&self` method.

mod json_lines;
mod memory;

pub use json_lines::JsonLinesSink;
pub use memory::MemorySink;

use crate::error::SinkError;
use crate::types::TrackedConversion;

/// Trait for analytics event receivers
pub trait AnalyticsSink {
    /// Short name used in delivery-failure logs
    fn name(&self) -> &str;

    /// Deliver one tracked conversion
    fn deliver(&self, event: &TrackedConversion) -> Result<(), SinkError>;
}
