//! SQLite-backed implementation of the record store port.
//!
//! The sync columns (`remote_id`, `should_sync`, `status`) are authoritative;
//! `payload_json` carries the full serialized record for submission and is
//! reconciled against the columns when read back. Status transitions are
//! single UPDATE statements so a record is never observed in a torn state.

use std::sync::Arc;

use async_trait::async_trait;
use fieldsync_core::RecordStore;
use fieldsync_domain::{
    ChangeKind, FieldSyncError, RecordChange, RecordStatus, Result as DomainResult, ShiftRecord,
};
use rusqlite::{params, OptionalExtension, Row};
use tokio::sync::broadcast;
use tokio::task;
use tracing::{debug, warn};
use uuid::Uuid;

use super::manager::DbManager;
use crate::api::submission::RemoteIdSink;
use crate::errors::InfraError;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// SQLite-backed record repository shared between the UI layer and the sync
/// coordinator.
pub struct SqliteRecordRepository {
    db: Arc<DbManager>,
    changes: broadcast::Sender<RecordChange>,
}

impl SqliteRecordRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    /// Insert or update a record and emit a change event.
    pub async fn save(&self, record: &ShiftRecord) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let to_save = record.clone();

        let kind = task::spawn_blocking(move || -> DomainResult<ChangeKind> {
            let conn = db.get_connection()?;
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM shifts WHERE local_id = ?1)",
                    params![to_save.local_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(InfraError::from)?;

            let payload_json = serde_json::to_string(&to_save).map_err(InfraError::from)?;
            conn.execute(
                "INSERT OR REPLACE INTO shifts (
                    local_id, remote_id, should_sync, status, user_id, shift_date,
                    payload_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    to_save.local_id.to_string(),
                    to_save.remote_id,
                    to_save.should_sync,
                    to_save.status.to_string(),
                    to_save.user_id,
                    to_save.date.to_string(),
                    payload_json,
                    to_save.created_at.timestamp(),
                ],
            )
            .map_err(InfraError::from)?;

            Ok(if exists { ChangeKind::Updated } else { ChangeKind::Created })
        })
        .await
        .map_err(InfraError::from)??;

        // No receivers is fine; triggers may not be running yet.
        let _ = self.changes.send(RecordChange { local_id: record.local_id, kind });
        debug!(local_id = %record.local_id, ?kind, "Record saved");
        Ok(())
    }

    /// Fetch a single record by its local identifier.
    pub async fn get(&self, local_id: Uuid) -> DomainResult<Option<ShiftRecord>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<ShiftRecord>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT payload_json, remote_id, should_sync, status
                     FROM shifts WHERE local_id = ?1",
                )
                .map_err(InfraError::from)?;
            let mut rows = stmt
                .query_map(params![local_id.to_string()], map_record_row)
                .map_err(InfraError::from)?;
            match rows.next() {
                Some(row) => Ok(Some(row.map_err(InfraError::from)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(InfraError::from)?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordRepository {
    async fn has_pending(&self) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM shifts WHERE should_sync = 1", [], |row| {
                    row.get(0)
                })
                .map_err(InfraError::from)?;
            Ok(count > 0)
        })
        .await
        .map_err(InfraError::from)?
    }

    async fn eligible_for_sync(&self) -> DomainResult<Vec<ShiftRecord>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<ShiftRecord>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT payload_json, remote_id, should_sync, status
                     FROM shifts WHERE should_sync = 1
                     ORDER BY created_at ASC",
                )
                .map_err(InfraError::from)?;
            let rows = stmt.query_map([], map_record_row).map_err(InfraError::from)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(InfraError::from)?);
            }
            Ok(records)
        })
        .await
        .map_err(InfraError::from)?
    }

    async fn mark_synced(&self, local_id: Uuid, remote_id: i64) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE shifts
                     SET remote_id = ?2, should_sync = 0, status = ?3
                     WHERE local_id = ?1",
                    params![
                        local_id.to_string(),
                        remote_id,
                        RecordStatus::Completed.to_string()
                    ],
                )
                .map_err(InfraError::from)?;
            if updated == 0 {
                return Err(FieldSyncError::NotFound(local_id.to_string()));
            }
            Ok(())
        })
        .await
        .map_err(InfraError::from)?
    }

    async fn mark_sync_failed(&self, local_id: Uuid) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE shifts SET status = ?2 WHERE local_id = ?1",
                    params![local_id.to_string(), RecordStatus::Failed.to_string()],
                )
                .map_err(InfraError::from)?;
            if updated == 0 {
                return Err(FieldSyncError::NotFound(local_id.to_string()));
            }
            Ok(())
        })
        .await
        .map_err(InfraError::from)?
    }

    fn change_events(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl RemoteIdSink for SqliteRecordRepository {
    async fn record_remote_ids(
        &self,
        shift_local_id: Uuid,
        shift_remote_id: i64,
        inspection_ids: &[(Uuid, i64)],
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let assigned = inspection_ids.to_vec();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let payload_json: Option<String> = conn
                .query_row(
                    "SELECT payload_json FROM shifts WHERE local_id = ?1",
                    params![shift_local_id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(InfraError::from)?;
            let Some(payload_json) = payload_json else {
                return Err(FieldSyncError::NotFound(shift_local_id.to_string()));
            };

            let mut record: ShiftRecord =
                serde_json::from_str(&payload_json).map_err(InfraError::from)?;
            record.remote_id = Some(shift_remote_id);
            for (inspection_id, remote_id) in &assigned {
                if let Some(inspection) =
                    record.inspections.iter_mut().find(|i| i.local_id == *inspection_id)
                {
                    inspection.remote_id = Some(*remote_id);
                }
            }

            let payload_json = serde_json::to_string(&record).map_err(InfraError::from)?;
            conn.execute(
                "UPDATE shifts SET remote_id = ?2, payload_json = ?3 WHERE local_id = ?1",
                params![shift_local_id.to_string(), shift_remote_id, payload_json],
            )
            .map_err(InfraError::from)?;

            debug!(
                local_id = %shift_local_id,
                remote_id = shift_remote_id,
                inspections = assigned.len(),
                "Remote ids recorded"
            );
            // Not broadcast: sync bookkeeping must not re-trigger a pass.
            Ok(())
        })
        .await
        .map_err(InfraError::from)?
    }
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<ShiftRecord> {
    let payload_json: String = row.get(0)?;
    let remote_id: Option<i64> = row.get(1)?;
    let should_sync: bool = row.get(2)?;
    let status_raw: String = row.get(3)?;

    let mut record: ShiftRecord = serde_json::from_str(&payload_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    // Columns win over the payload snapshot.
    record.remote_id = remote_id;
    record.should_sync = should_sync;
    record.status = parse_status(&record.local_id, &status_raw);
    Ok(record)
}

fn parse_status(local_id: &Uuid, raw: &str) -> RecordStatus {
    match raw.parse::<RecordStatus>() {
        Ok(status) => status,
        Err(err) => {
            warn!(
                local_id = %local_id,
                raw_status = %raw,
                error = %err,
                "invalid record status in store - defaulting to PendingSync"
            );
            RecordStatus::PendingSync
        }
    }
}
