//! Connectivity watcher with explicit lifecycle management.
//!
//! Periodically probes the remote authority's health endpoint, maintains the
//! last observed reachability for the coordinator's policy gate, and fires a
//! sync trigger on every unreachable-to-reachable transition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fieldsync_core::{ConnectivityMonitor, SyncCoordinator};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::triggers::error::{TriggerError, TriggerResult};

/// Something that can answer "is the remote side reachable right now".
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self) -> bool;
}

#[async_trait]
impl ConnectivityProbe for ApiClient {
    async fn probe(&self) -> bool {
        self.health_check().await
    }
}

/// Fire-and-forget sync trigger seam, so the watchers do not depend on the
/// concrete coordinator in tests.
pub trait SyncTrigger: Send + Sync {
    fn trigger(&self);
}

impl SyncTrigger for Arc<SyncCoordinator> {
    fn trigger(&self) {
        self.trigger_incremental_sync();
    }
}

/// Shared last-observed reachability, handed to the coordinator as its
/// [`ConnectivityMonitor`].
#[derive(Debug, Clone, Default)]
pub struct ReachabilityHandle {
    flag: Arc<AtomicBool>,
}

impl ReachabilityHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn swap(&self, reachable: bool) -> bool {
        self.flag.swap(reachable, Ordering::AcqRel)
    }
}

impl ConnectivityMonitor for ReachabilityHandle {
    fn is_reachable(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Configuration for the connectivity watcher.
#[derive(Debug, Clone)]
pub struct ConnectivityWatcherConfig {
    /// Interval between reachability probes
    pub probe_interval: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for ConnectivityWatcherConfig {
    fn default() -> Self {
        Self { probe_interval: Duration::from_secs(30), join_timeout: Duration::from_secs(5) }
    }
}

/// Connectivity watcher with start/stop lifecycle.
pub struct ConnectivityWatcher {
    probe: Arc<dyn ConnectivityProbe>,
    trigger: Arc<dyn SyncTrigger>,
    handle: ReachabilityHandle,
    config: ConnectivityWatcherConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ConnectivityWatcher {
    pub fn new(
        probe: Arc<dyn ConnectivityProbe>,
        trigger: Arc<dyn SyncTrigger>,
        config: ConnectivityWatcherConfig,
    ) -> Self {
        Self {
            probe,
            trigger,
            handle: ReachabilityHandle::new(),
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// The reachability handle to wire into the coordinator.
    pub fn handle(&self) -> ReachabilityHandle {
        self.handle.clone()
    }

    /// Start the watcher, spawning the background probe loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> TriggerResult<()> {
        if self.is_running() {
            return Err(TriggerError::AlreadyRunning);
        }

        info!("Starting connectivity watcher");
        self.cancellation = CancellationToken::new();

        let probe = Arc::clone(&self.probe);
        let trigger = Arc::clone(&self.trigger);
        let handle = self.handle.clone();
        let probe_interval = self.config.probe_interval;
        let cancel = self.cancellation.clone();

        let task = tokio::spawn(async move {
            loop {
                let reachable = probe.probe().await;
                let was_reachable = handle.swap(reachable);
                if reachable && !was_reachable {
                    info!("Network became reachable; triggering sync");
                    trigger.trigger();
                } else if !reachable && was_reachable {
                    debug!("Network became unreachable");
                }

                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Connectivity watcher loop cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(probe_interval) => {}
                }
            }
        });

        self.task_handle = Some(task);
        info!("Connectivity watcher started");
        Ok(())
    }

    /// Stop the watcher and wait for the probe loop to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> TriggerResult<()> {
        if !self.is_running() {
            return Err(TriggerError::NotRunning);
        }

        info!("Stopping connectivity watcher");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Watcher task panicked: {}", e);
                    return Err(TriggerError::TaskPanicked);
                }
                Err(_) => {
                    warn!("Watcher task did not complete within timeout");
                    return Err(TriggerError::StopTimeout {
                        seconds: self.config.join_timeout.as_secs(),
                    });
                }
            }
        }

        info!("Connectivity watcher stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }
}

impl Drop for ConnectivityWatcher {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ConnectivityWatcher dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    use super::*;

    /// Replays a scripted probe sequence; the last answer repeats.
    struct ScriptedProbe {
        answers: Mutex<Vec<bool>>,
        last: AtomicBool,
    }

    impl ScriptedProbe {
        fn new(answers: Vec<bool>) -> Arc<Self> {
            Arc::new(Self { answers: Mutex::new(answers), last: AtomicBool::new(false) })
        }
    }

    #[async_trait]
    impl ConnectivityProbe for ScriptedProbe {
        async fn probe(&self) -> bool {
            let mut answers = self.answers.lock();
            if answers.is_empty() {
                self.last.load(Ordering::SeqCst)
            } else {
                let answer = answers.remove(0);
                self.last.store(answer, Ordering::SeqCst);
                answer
            }
        }
    }

    #[derive(Default)]
    struct CountingTrigger(AtomicUsize);

    impl CountingTrigger {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl SyncTrigger for CountingTrigger {
        fn trigger(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fast_config() -> ConnectivityWatcherConfig {
        ConnectivityWatcherConfig {
            probe_interval: Duration::from_millis(10),
            join_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn triggers_once_per_reachable_transition() {
        let probe = ScriptedProbe::new(vec![false, true, true, true]);
        let trigger = Arc::new(CountingTrigger::default());
        let mut watcher = ConnectivityWatcher::new(probe, trigger.clone(), fast_config());

        watcher.start().await.expect("start");
        tokio::time::sleep(Duration::from_millis(100)).await;
        watcher.stop().await.expect("stop");

        assert_eq!(trigger.count(), 1, "only the false->true edge triggers");
        assert!(watcher.handle().is_reachable());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_probe_never_triggers() {
        let probe = ScriptedProbe::new(vec![false]);
        let trigger = Arc::new(CountingTrigger::default());
        let mut watcher = ConnectivityWatcher::new(probe, trigger.clone(), fast_config());

        watcher.start().await.expect("start");
        tokio::time::sleep(Duration::from_millis(60)).await;
        watcher.stop().await.expect("stop");

        assert_eq!(trigger.count(), 0);
        assert!(!watcher.handle().is_reachable());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_guards_double_start_and_stop() {
        let probe = ScriptedProbe::new(vec![true]);
        let trigger = Arc::new(CountingTrigger::default());
        let mut watcher = ConnectivityWatcher::new(probe, trigger, fast_config());

        assert!(matches!(watcher.stop().await, Err(TriggerError::NotRunning)));
        watcher.start().await.expect("start");
        assert!(matches!(watcher.start().await, Err(TriggerError::AlreadyRunning)));
        watcher.stop().await.expect("stop");
        assert!(!watcher.is_running());
    }
}
