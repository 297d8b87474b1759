//! Sync session and bootstrap state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of the current sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// A transient run of the sync coordinator.
///
/// Exactly one session may be `Running` at a time process-wide; the
/// coordinator's single-flight guard enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSession {
    pub state: SessionState,
    pub started_at: Option<DateTime<Utc>>,
    pub had_errors: bool,
}

impl SyncSession {
    pub fn new() -> Self {
        Self { state: SessionState::Idle, started_at: None, had_errors: false }
    }

    /// Transition to `Running` and stamp the start time.
    pub fn begin(&mut self) {
        self.state = SessionState::Running;
        self.started_at = Some(Utc::now());
        self.had_errors = false;
    }

    /// Transition to `Finished` with the aggregate outcome.
    pub fn finish(&mut self, had_errors: bool) {
        self.state = SessionState::Finished;
        self.had_errors = had_errors;
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the reference tables required before record creation have been
/// fetched at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapState {
    Empty,
    Populated,
}

/// Kind of mutation observed on the local record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
}

/// A change event emitted by the record store whenever any record is
/// created or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordChange {
    pub local_id: Uuid,
    pub kind: ChangeKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_lifecycle() {
        let mut session = SyncSession::new();
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.started_at.is_none());

        session.begin();
        assert_eq!(session.state, SessionState::Running);
        assert!(session.started_at.is_some());
        assert!(!session.had_errors);

        session.finish(true);
        assert_eq!(session.state, SessionState::Finished);
        assert!(session.had_errors);
    }

    #[test]
    fn begin_resets_previous_outcome() {
        let mut session = SyncSession::new();
        session.begin();
        session.finish(true);
        session.begin();
        assert!(!session.had_errors);
    }
}
