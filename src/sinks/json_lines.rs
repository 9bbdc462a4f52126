//! JSON-lines file sink
//!
//! Appends one JSON object per delivered event to a local file. Useful for
//! piping conversion telemetry into log shippers or offline analysis.

use super::AnalyticsSink;
use crate::error::SinkError;
use crate::types::TrackedConversion;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sink that appends NDJSON records to a file
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnalyticsSink for JsonLinesSink {
    fn name(&self) -> &str {
        "json_lines"
    }

    fn deliver(&self, event: &TrackedConversion) -> Result<(), SinkError> {
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
