//! Session state and stores
//!
//! One session per visitor-browser-lifetime: a stable generated id, the
//! cached attribution, sticky experiment assignments, and a capped
//! append-only conversion log. The store trait abstracts where that state
//! lives so the engine can run against an in-memory double in tests and a
//! durable file record in an embedding host.

use crate::types::{Attribution, TrackedConversion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Maximum conversion-log entries retained per session; the oldest
/// entries rotate out to bound durable storage size
pub const MAX_CONVERSION_LOG: usize = 100;

/// Per-visitor session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque id, generated once and stable for the session
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
    /// Experiment id → variant id
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub experiment_assignments: HashMap<String, String>,
    /// Append-only, insertion order significant, capped at
    /// [`MAX_CONVERSION_LOG`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversion_log: Vec<TrackedConversion>,
}

impl Session {
    /// Create a fresh session with a newly generated id
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: now,
            last_activity_at: now,
            attribution: None,
            experiment_assignments: HashMap::new(),
            conversion_log: Vec::new(),
        }
    }

    fn push_conversion(&mut self, event: TrackedConversion) {
        self.conversion_log.push(event);
        if self.conversion_log.len() > MAX_CONVERSION_LOG {
            let excess = self.conversion_log.len() - MAX_CONVERSION_LOG;
            self.conversion_log.drain(..excess);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Where session state lives.
///
/// Mutations are safe to call from any UI component without coordination:
/// nothing in the model needs cross-field atomicity beyond map insertion.
pub trait SessionStore {
    /// Current session, created on first access if absent
    fn session(&mut self) -> &Session;

    /// Record visitor activity
    fn touch(&mut self);

    /// Replace the cached attribution
    fn set_attribution(&mut self, attribution: Attribution);

    /// Record a sticky experiment assignment
    fn set_assignment(&mut self, experiment_id: &str, variant_id: &str);

    /// Append a tracked conversion to the session log
    fn append_conversion(&mut self, event: TrackedConversion);
}

/// In-memory store: the test double, and the default for ephemeral
/// embeddings that do not need reload survival
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Session,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn session(&mut self) -> &Session {
        &self.session
    }

    fn touch(&mut self) {
        self.session.last_activity_at = Utc::now();
    }

    fn set_attribution(&mut self, attribution: Attribution) {
        self.session.attribution = Some(attribution);
        self.touch();
    }

    fn set_assignment(&mut self, experiment_id: &str, variant_id: &str) {
        self.session
            .experiment_assignments
            .insert(experiment_id.to_string(), variant_id.to_string());
        self.touch();
    }

    fn append_conversion(&mut self, event: TrackedConversion) {
        self.session.push_conversion(event);
        self.touch();
    }
}

/// Durable store: one JSON record per visitor at a fixed path, rewritten
/// whole on every mutation (last-write-wins at session granularity).
///
/// Persistence failures degrade to warnings; session state stays usable in
/// memory and the UI path is never interrupted.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    session: Session,
}

impl FileSessionStore {
    /// Load the session record at `path`, or create a fresh session if the
    /// record is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let session = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(session) => session,
                Err(error) => {
                    warn!(path = %path.display(), %error, "session record corrupt, starting fresh");
                    Session::new()
                }
            },
            Err(_) => Session::new(),
        };
        Self { path, session }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        let serialized = match serde_json::to_string(&self.session) {
            Ok(serialized) => serialized,
            Err(error) => {
                warn!(%error, "failed to serialize session");
                return;
            }
        };
        if let Err(error) = std::fs::write(&self.path, serialized) {
            warn!(path = %self.path.display(), %error, "failed to persist session");
        }
    }
}

impl SessionStore for FileSessionStore {
    fn session(&mut self) -> &Session {
        &self.session
    }

    fn touch(&mut self) {
        self.session.last_activity_at = Utc::now();
        self.persist();
    }

    fn set_attribution(&mut self, attribution: Attribution) {
        self.session.attribution = Some(attribution);
        self.session.last_activity_at = Utc::now();
        self.persist();
    }

    fn set_assignment(&mut self, experiment_id: &str, variant_id: &str) {
        self.session
            .experiment_assignments
            .insert(experiment_id.to_string(), variant_id.to_string());
        self.session.last_activity_at = Utc::now();
        self.persist();
    }

    fn append_conversion(&mut self, event: TrackedConversion) {
        self.session.push_conversion(event);
        self.session.last_activity_at = Utc::now();
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConversionEvent;

    fn tracked(name: &str) -> TrackedConversion {
        TrackedConversion {
            event: ConversionEvent::new(name),
            timestamp: Utc::now(),
            attribution: None,
            assignments: HashMap::new(),
            lead_score: None,
        }
    }

    #[test]
    fn new_session_has_fresh_id_and_empty_state() {
        let mut store = MemorySessionStore::new();
        let session = store.session();
        assert!(!session.session_id.is_empty());
        assert!(session.attribution.is_none());
        assert!(session.experiment_assignments.is_empty());
        assert!(session.conversion_log.is_empty());
    }

    #[test]
    fn touch_advances_last_activity() {
        let mut store = MemorySessionStore::new();
        let before = store.session().last_activity_at;
        store.touch();
        assert!(store.session().last_activity_at >= before);
    }

    #[test]
    fn assignments_are_recorded() {
        let mut store = MemorySessionStore::new();
        store.set_assignment("hero_copy", "control");
        assert_eq!(
            store.session().experiment_assignments.get("hero_copy"),
            Some(&"control".to_string())
        );
    }

    #[test]
    fn conversion_log_preserves_order_and_rotates() {
        let mut store = MemorySessionStore::new();
        for i in 0..(MAX_CONVERSION_LOG + 5) {
            store.append_conversion(tracked(&format!("event-{i}")));
        }

        let log = &store.session().conversion_log;
        assert_eq!(log.len(), MAX_CONVERSION_LOG);
        // Oldest five rotated out; order of the remainder preserved
        assert_eq!(log.first().unwrap().event.event_name, "event-5");
        assert_eq!(
            log.last().unwrap().event.event_name,
            format!("event-{}", MAX_CONVERSION_LOG + 4)
        );
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let first_id = {
            let mut store = FileSessionStore::open(&path);
            store.set_assignment("hero_copy", "benefit_led");
            store.append_conversion(tracked("signup"));
            store.session().session_id.clone()
        };

        let mut reopened = FileSessionStore::open(&path);
        let session = reopened.session();
        assert_eq!(session.session_id, first_id);
        assert_eq!(
            session.experiment_assignments.get("hero_copy"),
            Some(&"benefit_led".to_string())
        );
        assert_eq!(session.conversion_log.len(), 1);
    }

    #[test]
    fn corrupt_record_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut store = FileSessionStore::open(&path);
        assert!(store.session().conversion_log.is_empty());
    }
}
