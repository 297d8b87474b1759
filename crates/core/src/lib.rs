//! # FieldSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The offline sync coordinator and its session lifecycle
//! - Port/adapter interfaces (traits)
//! - The single-flight guard and trigger-policy gate
//!
//! ## Architecture Principles
//! - Only depends on `fieldsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod sync;

// Re-export specific items to avoid ambiguity
pub use sync::coordinator::{CoordinatorConfig, CoordinatorDeps, SyncCoordinator};
pub use sync::errors::{SyncError, SyncErrorCategory};
pub use sync::gate::{GateState, PromptGate};
pub use sync::guard::{SingleFlight, SyncPermit};
pub use sync::ports::{
    AuthGate, ConnectivityMonitor, ProgressSink, RecordStore, RecordSubmitter,
    ReferenceDataClient, SyncPrompt,
};
