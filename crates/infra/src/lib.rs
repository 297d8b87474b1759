//! # FieldSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite record and code-table repositories)
//! - HTTP clients for the remote authority
//! - Sync triggers (connectivity watcher, change listener)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `fieldsync-core`
//! - Depends on `fieldsync-domain` and `fieldsync-core`
//! - Contains all "impure" code (I/O, sockets, clocks)

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod triggers;

pub use api::{
    ApiClient, ApiClientConfig, CodeTableClient, RemoteIdSink, SessionAuthGate,
    ShiftSubmissionClient,
};
pub use database::{DbManager, SqliteCodeTableRepository, SqliteRecordRepository};
pub use errors::InfraError;
pub use triggers::{
    ChangeListener, ChangeListenerConfig, ConnectivityProbe, ConnectivityWatcher,
    ConnectivityWatcherConfig, ReachabilityHandle, SyncTrigger, TriggerError, TriggerResult,
};
