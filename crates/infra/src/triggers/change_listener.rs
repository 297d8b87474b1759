//! Change listener: turns record-store mutations into sync triggers.

use std::sync::Arc;
use std::time::Duration;

use fieldsync_core::RecordStore;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::connectivity_watcher::SyncTrigger;
use super::error::{TriggerError, TriggerResult};

/// Configuration for the change listener.
#[derive(Debug, Clone)]
pub struct ChangeListenerConfig {
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for ChangeListenerConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5) }
    }
}

/// Subscribes to the record store's change events and fires a sync trigger
/// for each one. Redundant triggers are harmless; the coordinator's policy
/// gate absorbs them.
pub struct ChangeListener {
    store: Arc<dyn RecordStore>,
    trigger: Arc<dyn SyncTrigger>,
    config: ChangeListenerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ChangeListener {
    pub fn new(
        store: Arc<dyn RecordStore>,
        trigger: Arc<dyn SyncTrigger>,
        config: ChangeListenerConfig,
    ) -> Self {
        Self {
            store,
            trigger,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the listener, spawning the background event loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> TriggerResult<()> {
        if self.is_running() {
            return Err(TriggerError::AlreadyRunning);
        }

        info!("Starting change listener");
        self.cancellation = CancellationToken::new();

        let mut events = self.store.change_events();
        let trigger = Arc::clone(&self.trigger);
        let cancel = self.cancellation.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Change listener loop cancelled");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(change) => {
                            debug!(local_id = %change.local_id, kind = ?change.kind, "Record changed");
                            trigger.trigger();
                        }
                        Err(RecvError::Lagged(missed)) => {
                            // Missed events still mean "something changed".
                            warn!(missed, "Change events lagged");
                            trigger.trigger();
                        }
                        Err(RecvError::Closed) => {
                            debug!("Change event channel closed");
                            break;
                        }
                    }
                }
            }
        });

        self.task_handle = Some(task);
        info!("Change listener started");
        Ok(())
    }

    /// Stop the listener and wait for the event loop to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> TriggerResult<()> {
        if !self.is_running() {
            return Err(TriggerError::NotRunning);
        }

        info!("Stopping change listener");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Listener task panicked: {}", e);
                    return Err(TriggerError::TaskPanicked);
                }
                Err(_) => {
                    warn!("Listener task did not complete within timeout");
                    return Err(TriggerError::StopTimeout {
                        seconds: self.config.join_timeout.as_secs(),
                    });
                }
            }
        }

        info!("Change listener stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ChangeListener dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use fieldsync_domain::{
        ChangeKind, RecordChange, Result as DomainResult, ShiftRecord,
    };
    use tokio::sync::broadcast;
    use uuid::Uuid;

    use super::*;

    struct ChannelStore {
        changes: broadcast::Sender<RecordChange>,
    }

    impl ChannelStore {
        fn new() -> Arc<Self> {
            let (changes, _) = broadcast::channel(16);
            Arc::new(Self { changes })
        }

        fn emit(&self, kind: ChangeKind) {
            let _ = self.changes.send(RecordChange { local_id: Uuid::new_v4(), kind });
        }
    }

    #[async_trait]
    impl RecordStore for ChannelStore {
        async fn has_pending(&self) -> DomainResult<bool> {
            Ok(false)
        }

        async fn eligible_for_sync(&self) -> DomainResult<Vec<ShiftRecord>> {
            Ok(Vec::new())
        }

        async fn mark_synced(&self, _local_id: Uuid, _remote_id: i64) -> DomainResult<()> {
            Ok(())
        }

        async fn mark_sync_failed(&self, _local_id: Uuid) -> DomainResult<()> {
            Ok(())
        }

        fn change_events(&self) -> broadcast::Receiver<RecordChange> {
            self.changes.subscribe()
        }
    }

    #[derive(Default)]
    struct CountingTrigger(AtomicUsize);

    impl SyncTrigger for CountingTrigger {
        fn trigger(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn each_change_event_fires_a_trigger() {
        let store = ChannelStore::new();
        let trigger = Arc::new(CountingTrigger::default());
        let mut listener =
            ChangeListener::new(store.clone(), trigger.clone(), ChangeListenerConfig::default());

        listener.start().await.expect("start");
        tokio::time::sleep(Duration::from_millis(20)).await;

        store.emit(ChangeKind::Created);
        store.emit(ChangeKind::Updated);
        tokio::time::sleep(Duration::from_millis(50)).await;

        listener.stop().await.expect("stop");
        assert_eq!(trigger.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_before_start_is_an_error() {
        let store = ChannelStore::new();
        let trigger = Arc::new(CountingTrigger::default());
        let mut listener = ChangeListener::new(store, trigger, ChangeListenerConfig::default());

        assert!(matches!(listener.stop().await, Err(TriggerError::NotRunning)));
    }
}
