//! Remote submission client for shift records.
//!
//! A shift is submitted parent-first: the shift payload is created (or
//! updated when a remote id is already known), then each not-yet-submitted
//! nested inspection is posted under the assigned remote id. Remote ids are
//! written back to the store the moment the remote assigns them, so a retry
//! after a partial failure updates the existing shift instead of creating a
//! duplicate and skips inspections that already went through.

use std::sync::Arc;

use async_trait::async_trait;
use fieldsync_core::{RecordSubmitter, SyncError};
use fieldsync_domain::{InspectionPayload, Result as DomainResult, ShiftRecord};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::client::ApiClient;

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: i64,
}

/// Write-back seam for remote ids assigned during submission. Implemented by
/// the record repository; persisting each id as it arrives keeps a partially
/// submitted record replay-safe across passes.
#[async_trait]
pub trait RemoteIdSink: Send + Sync {
    /// Persist the shift's remote id and any newly assigned inspection ids
    /// without touching the record's sync status.
    async fn record_remote_ids(
        &self,
        shift_local_id: Uuid,
        shift_remote_id: i64,
        inspection_ids: &[(Uuid, i64)],
    ) -> DomainResult<()>;
}

/// [`RecordSubmitter`] implementation talking to the remote authority.
pub struct ShiftSubmissionClient {
    api: Arc<ApiClient>,
    ids: Arc<dyn RemoteIdSink>,
}

impl ShiftSubmissionClient {
    pub fn new(api: Arc<ApiClient>, ids: Arc<dyn RemoteIdSink>) -> Self {
        Self { api, ids }
    }

    async fn submit_shift(&self, record: &ShiftRecord) -> Result<i64, SyncError> {
        let payload = record.payload();
        let builder = match record.remote_id {
            Some(remote_id) => {
                self.api.request(Method::PUT, &format!("/shifts/{remote_id}")).json(&payload)
            }
            None => self.api.request(Method::POST, "/shifts").json(&payload),
        };

        let response = self.api.send(builder).await?;
        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Submission(format!("invalid shift response: {e}")))?;

        // The shift now exists remotely; persist its id before any nested
        // submission can fail the record.
        if record.remote_id.is_none() {
            self.ids.record_remote_ids(record.local_id, body.id, &[]).await?;
        }
        Ok(body.id)
    }

    async fn submit_inspections(
        &self,
        record: &ShiftRecord,
        shift_remote_id: i64,
    ) -> Result<(), SyncError> {
        for inspection in record.inspections.iter().filter(|i| i.remote_id.is_none()) {
            let payload = InspectionPayload::from(inspection);
            let builder = self
                .api
                .request(Method::POST, &format!("/shifts/{shift_remote_id}/inspections"))
                .json(&payload);
            let response = self.api.send(builder).await?;
            let body: IdResponse = response
                .json()
                .await
                .map_err(|e| SyncError::Submission(format!("invalid inspection response: {e}")))?;
            self.ids
                .record_remote_ids(record.local_id, shift_remote_id, &[(inspection.local_id, body.id)])
                .await?;
            debug!(
                inspection_id = %inspection.local_id,
                remote_id = body.id,
                "Inspection submitted"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSubmitter for ShiftSubmissionClient {
    #[instrument(skip(self, record), fields(local_id = %record.local_id))]
    async fn submit(&self, record: &ShiftRecord) -> Result<i64, SyncError> {
        let shift_remote_id = self.submit_shift(record).await?;
        debug!(remote_id = shift_remote_id, "Shift submitted");
        self.submit_inspections(record, shift_remote_id).await?;
        Ok(shift_remote_id)
    }
}
