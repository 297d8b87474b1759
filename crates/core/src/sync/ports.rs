//! Port interfaces for sync operations
//!
//! The coordinator only depends on these contracts; infra provides the
//! implementations (SQLite store, HTTP clients, connectivity probe) and the
//! UI layer provides the prompt and progress collaborators.

use async_trait::async_trait;
use fieldsync_domain::{RecordChange, Result, ShiftRecord};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::sync::errors::SyncError;

/// Network reachability as last observed by the connectivity monitor.
pub trait ConnectivityMonitor: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Trait for the local record store shared with the UI layer.
///
/// The coordinator only reads eligibility and writes back sync fields;
/// `mark_synced` and `mark_sync_failed` must each be a single atomic update
/// so a record is never observed in a torn state (e.g. `Completed` with
/// `should_sync == true`).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether any record currently satisfies `should_sync == true`.
    async fn has_pending(&self) -> Result<bool>;

    /// Snapshot of all eligible records. Records created after this call
    /// are not part of the current pass.
    async fn eligible_for_sync(&self) -> Result<Vec<ShiftRecord>>;

    /// Record a successful submission: sets `remote_id`, clears
    /// `should_sync`, sets status `Completed` - atomically.
    async fn mark_synced(&self, local_id: Uuid, remote_id: i64) -> Result<()>;

    /// Record a failed submission: keeps `should_sync`, sets status
    /// `Failed` - atomically. The record stays eligible for the next pass.
    async fn mark_sync_failed(&self, local_id: Uuid) -> Result<()>;

    /// Subscribe to change events emitted on every record create/update.
    fn change_events(&self) -> broadcast::Receiver<RecordChange>;
}

/// Trait reporting whether a valid session exists and, if not, driving the
/// (out-of-scope) re-authentication flow.
#[async_trait]
pub trait AuthGate: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Run the authentication flow; may wait on user interaction.
    /// Returns true when a valid session exists afterwards.
    async fn request_authentication(&self) -> bool;
}

/// Per-record-type remote submission client.
#[async_trait]
pub trait RecordSubmitter: Send + Sync {
    /// Attempt to create/update the record remotely. Returns the assigned
    /// remote identifier on success.
    async fn submit(&self, record: &ShiftRecord) -> std::result::Result<i64, SyncError>;
}

/// Reference-data (code table) client used by the initial bootstrap sync.
#[async_trait]
pub trait ReferenceDataClient: Send + Sync {
    /// Whether the bootstrap tables have been fetched at least once.
    async fn is_populated(&self) -> Result<bool>;

    /// Fetch and persist all bootstrap tables, reporting per-table progress.
    async fn fetch_bootstrap_tables(
        &self,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<(), SyncError>;
}

/// Fire-and-forget human-readable status reporting.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

/// User confirmation collaborator for the re-authentication prompt.
#[async_trait]
pub trait SyncPrompt: Send + Sync {
    /// Returns true when the user accepts.
    async fn confirm(&self, title: &str, message: &str) -> bool;
}
