//! Offline sync coordinator
//!
//! Owns the sync-session lifecycle, the single-flight guard, the triggering
//! policy, and the orchestration of concurrent per-record submissions.
//!
//! Connectivity transitions and local-store mutations both funnel into
//! [`SyncCoordinator::trigger_incremental_sync`]; the policy gate and the
//! single-flight guard make redundant triggers safe. A pass snapshots the
//! eligible records, fans out bounded concurrent submissions, joins on all
//! of them, writes each record's outcome back atomically, and reports a
//! single aggregate result to the progress sink. No error crosses the
//! coordinator boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fieldsync_domain::{ShiftRecord, SyncSession};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::sync::errors::SyncError;
use crate::sync::gate::PromptGate;
use crate::sync::guard::{SingleFlight, SyncPermit};
use crate::sync::ports::{
    AuthGate, ConnectivityMonitor, ProgressSink, RecordStore, RecordSubmitter,
    ReferenceDataClient, SyncPrompt,
};

const AUTH_REQUIRED_TITLE: &str = "Authentication Required";
const AUTH_REQUIRED_INCREMENTAL: &str = "You have items that need to be synced.\n\
     Would you like to authenticate now and synchronize?\n\n\
     If you select no, automatic sync will be turned off until the app is reopened.";
const AUTH_REQUIRED_INITIAL: &str = "You need to authenticate to perform the initial sync.\n\
     Would you like to authenticate now and synchronize?\n\n\
     If you select no, you will not be able to create records.";

/// Configuration for the sync coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum number of concurrent record submissions per pass
    pub max_concurrency: usize,
    /// Timeout for a single record submission
    pub submission_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { max_concurrency: 4, submission_timeout: Duration::from_secs(60) }
    }
}

/// Collaborators injected into the coordinator.
pub struct CoordinatorDeps {
    pub store: Arc<dyn RecordStore>,
    pub connectivity: Arc<dyn ConnectivityMonitor>,
    pub auth: Arc<dyn AuthGate>,
    pub submitter: Arc<dyn RecordSubmitter>,
    pub reference: Arc<dyn ReferenceDataClient>,
    pub progress: Arc<dyn ProgressSink>,
    pub prompt: Arc<dyn SyncPrompt>,
}

/// Outcome of one record submission within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassOutcome {
    Completed,
    Failed,
    /// Not attempted because authentication was lost mid-pass; the record
    /// is untouched and stays eligible.
    Skipped,
}

/// Explicitly constructed, injectable sync coordinator; one instance per
/// running application.
pub struct SyncCoordinator {
    store: Arc<dyn RecordStore>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    auth: Arc<dyn AuthGate>,
    submitter: Arc<dyn RecordSubmitter>,
    reference: Arc<dyn ReferenceDataClient>,
    progress: Arc<dyn ProgressSink>,
    prompt: Arc<dyn SyncPrompt>,
    config: CoordinatorConfig,
    guard: SingleFlight,
    gate: Mutex<PromptGate>,
    session: Mutex<SyncSession>,
}

impl SyncCoordinator {
    pub fn new(deps: CoordinatorDeps, config: CoordinatorConfig) -> Self {
        let CoordinatorDeps { store, connectivity, auth, submitter, reference, progress, prompt } =
            deps;
        Self {
            store,
            connectivity,
            auth,
            submitter,
            reference,
            progress,
            prompt,
            config,
            guard: SingleFlight::new(),
            gate: Mutex::new(PromptGate::new()),
            session: Mutex::new(SyncSession::new()),
        }
    }

    /// Idempotent, non-blocking request to run a sync pass.
    ///
    /// Safe to call redundantly from the connectivity watcher and the
    /// change listener; the policy gate and single-flight guard turn
    /// duplicate requests into no-ops.
    pub fn trigger_incremental_sync(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.sync_if_possible().await;
        });
    }

    /// Snapshot of the current session state for observers.
    pub fn session(&self) -> SyncSession {
        self.session.lock().clone()
    }

    /// Whether a sync pass is currently in flight.
    pub fn is_synchronizing(&self) -> bool {
        self.guard.is_held()
    }

    /// Whether the prompt gate is latched ("manual sync required").
    pub fn is_manual_sync_required(&self) -> bool {
        self.gate.lock().is_latched()
    }

    /// Trigger policy: the network is reachable and at least one eligible
    /// record exists. Authentication is handled separately because it may
    /// prompt the user.
    pub async fn should_sync(&self) -> bool {
        if !self.connectivity.is_reachable() {
            debug!("Network unreachable; ignoring trigger");
            return false;
        }

        match self.store.has_pending().await {
            Ok(true) => true,
            Ok(false) => {
                debug!("No eligible records; ignoring trigger");
                false
            }
            Err(err) => {
                warn!(error = %err, "Could not query pending records");
                false
            }
        }
    }

    /// Evaluate the triggering policy and run a pass if it allows.
    #[instrument(skip(self))]
    pub async fn sync_if_possible(&self) {
        if self.guard.is_held() {
            debug!("Sync already in flight; ignoring trigger");
            return;
        }

        if !self.should_sync().await {
            return;
        }

        if !self.auth.is_authenticated() {
            self.handle_unauthenticated().await;
            return;
        }

        // A session restored outside the prompt flow clears the latch.
        {
            let mut gate = self.gate.lock();
            if gate.is_latched() {
                info!("Session restored; re-arming automatic sync");
                gate.rearm();
            }
        }

        let Some(permit) = self.guard.try_acquire() else {
            debug!("Lost the single-flight race; another pass is running");
            return;
        };

        self.run_pass(permit).await;
    }

    /// Runs the bootstrap procedure: fetch the reference tables required
    /// before any record can be created. Returns the outcome; `false`
    /// covers every guard rejection (unreachable, already populated,
    /// declined authentication, pass in flight) as well as fetch failure.
    #[instrument(skip(self))]
    pub async fn perform_initial_sync(&self) -> bool {
        if !self.connectivity.is_reachable() {
            debug!("Network unreachable; skipping initial sync");
            return false;
        }

        match self.reference.is_populated().await {
            Ok(true) => {
                debug!("Bootstrap tables already populated; initial sync is a no-op");
                return false;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(error = %err, "Could not determine bootstrap state");
                return false;
            }
        }

        if !self.auth.is_authenticated()
            && !self.prompt_for_authentication(AUTH_REQUIRED_INITIAL).await
        {
            return false;
        }

        let Some(_permit) = self.guard.try_acquire() else {
            debug!("A sync pass is in flight; initial sync not started");
            return false;
        };

        self.session.lock().begin();
        info!("Performing initial sync");
        self.progress.report("Performing initial sync");

        let result = self.reference.fetch_bootstrap_tables(self.progress.as_ref()).await;
        let ok = match result {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Bootstrap fetch failed");
                self.progress.report("Could not fetch code tables");
                false
            }
        };

        self.session.lock().finish(!ok);
        self.progress.report(if ok { "Initial sync completed" } else { "Initial sync failed" });
        ok
    }

    /// Prompt the user to authenticate. Returns true when a valid session
    /// exists afterwards; latches the gate on decline or failure.
    async fn prompt_for_authentication(&self, message: &str) -> bool {
        if self.gate.lock().is_latched() {
            debug!("Prompt gate latched; manual sync required");
            return false;
        }

        let accepted = self.prompt.confirm(AUTH_REQUIRED_TITLE, message).await;
        if accepted && self.auth.request_authentication().await {
            self.gate.lock().rearm();
            return true;
        }

        info!("Re-authentication declined or failed; latching automatic sync");
        self.gate.lock().latch();
        false
    }

    async fn handle_unauthenticated(&self) {
        if self.prompt_for_authentication(AUTH_REQUIRED_INCREMENTAL).await {
            // Re-evaluate the whole policy now that a session exists.
            Box::pin(self.sync_if_possible()).await;
        }
    }

    /// One submission-and-join cycle. Entered only with the single-flight
    /// permit held; the permit releases the guard on every exit path.
    async fn run_pass(&self, _permit: SyncPermit) {
        self.session.lock().begin();

        let records = match self.store.eligible_for_sync().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "Could not snapshot eligible records; aborting pass");
                self.progress.report("Could not read local records");
                self.session.lock().finish(true);
                return;
            }
        };

        if records.is_empty() {
            debug!("Eligible set drained before the pass started");
            self.session.lock().finish(false);
            return;
        }

        info!(count = records.len(), "Executing sync pass");

        // Set once a submission fails with an expired session; submissions
        // that have not started yet are skipped and stay eligible.
        let auth_lost = Arc::new(AtomicBool::new(false));

        let outcomes: Vec<PassOutcome> = stream::iter(records.into_iter().map(|record| {
            let auth_lost = Arc::clone(&auth_lost);
            async move { self.submit_one(record, &auth_lost).await }
        }))
        .buffer_unordered(self.config.max_concurrency.max(1))
        .collect()
        .await;

        let had_errors = outcomes.iter().any(|outcome| *outcome == PassOutcome::Failed);
        let completed =
            outcomes.iter().filter(|outcome| **outcome == PassOutcome::Completed).count();
        let skipped = outcomes.iter().filter(|outcome| **outcome == PassOutcome::Skipped).count();

        info!(completed, skipped, had_errors, "Sync pass finished");

        self.session.lock().finish(had_errors);
        self.progress.report(if had_errors { "Could not sync items" } else { "Sync executed" });
    }

    /// Submit one record and write its outcome back atomically.
    async fn submit_one(&self, record: ShiftRecord, auth_lost: &AtomicBool) -> PassOutcome {
        if auth_lost.load(Ordering::Acquire) {
            debug!(local_id = %record.local_id, "Skipping submission; session expired mid-pass");
            return PassOutcome::Skipped;
        }

        let local_id = record.local_id;
        let result =
            tokio::time::timeout(self.config.submission_timeout, self.submitter.submit(&record))
                .await
                .unwrap_or(Err(SyncError::Timeout(self.config.submission_timeout)));

        match result {
            Ok(remote_id) => {
                debug!(local_id = %local_id, remote_id, "Record submitted");
                match self.store.mark_synced(local_id, remote_id).await {
                    Ok(()) => PassOutcome::Completed,
                    Err(err) => {
                        warn!(local_id = %local_id, error = %err, "mark_synced failed");
                        PassOutcome::Failed
                    }
                }
            }
            Err(err) => {
                if matches!(err, SyncError::Unauthenticated) {
                    auth_lost.store(true, Ordering::Release);
                }
                warn!(local_id = %local_id, error = %err, "Record submission failed");
                if let Err(mark_err) = self.store.mark_sync_failed(local_id).await {
                    warn!(local_id = %local_id, error = %mark_err, "mark_sync_failed failed");
                }
                PassOutcome::Failed
            }
        }
    }
}
