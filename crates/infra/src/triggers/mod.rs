//! Sync triggers: connectivity transitions and record-store changes.

pub mod change_listener;
pub mod connectivity_watcher;
pub mod error;

pub use change_listener::{ChangeListener, ChangeListenerConfig};
pub use connectivity_watcher::{
    ConnectivityProbe, ConnectivityWatcher, ConnectivityWatcherConfig, ReachabilityHandle,
    SyncTrigger,
};
pub use error::{TriggerError, TriggerResult};
