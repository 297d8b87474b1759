//! Sync-specific error types
//!
//! Provides error classification for sync operations with retry metadata.

use fieldsync_domain::FieldSyncError;
use thiserror::Error;

/// Categories of sync errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncErrorCategory {
    /// No connectivity - retry on the next reachable transition
    Connectivity,
    /// Session absent or expired - retry after re-authentication
    Authentication,
    /// Local store unreadable - retryable
    Store,
    /// Per-record remote submission failure - retryable
    Submission,
    /// Reference-table fetch failure - retryable
    Bootstrap,
    /// Cancelled or misconfigured - non-retryable
    Terminal,
}

/// Sync operation errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network unreachable")]
    Unreachable,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Store query failed: {0}")]
    StoreQuery(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Bootstrap fetch failed: {0}")]
    Bootstrap(String),

    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    /// Get the error category for this error
    pub fn category(&self) -> SyncErrorCategory {
        match self {
            Self::Unreachable => SyncErrorCategory::Connectivity,
            Self::Unauthenticated => SyncErrorCategory::Authentication,
            Self::StoreQuery(_) => SyncErrorCategory::Store,
            Self::Submission(_) | Self::Timeout(_) => SyncErrorCategory::Submission,
            Self::Bootstrap(_) => SyncErrorCategory::Bootstrap,
            Self::Cancelled => SyncErrorCategory::Terminal,
        }
    }

    /// Check if a future pass may succeed for this error
    pub fn should_retry(&self) -> bool {
        !matches!(self.category(), SyncErrorCategory::Terminal)
    }

    /// Advisory retry delay in seconds. Retries only happen on the next
    /// qualifying trigger; this is metadata for a future backoff policy.
    pub fn retry_delay_secs(&self) -> u64 {
        match self.category() {
            SyncErrorCategory::Connectivity => 30,
            SyncErrorCategory::Authentication => 5,
            SyncErrorCategory::Store => 2,
            SyncErrorCategory::Submission => 10,
            SyncErrorCategory::Bootstrap => 30,
            SyncErrorCategory::Terminal => 0,
        }
    }
}

impl From<FieldSyncError> for SyncError {
    fn from(err: FieldSyncError) -> Self {
        match err {
            FieldSyncError::Database(message) => Self::StoreQuery(message),
            FieldSyncError::Network(message) => Self::Submission(message),
            FieldSyncError::Auth(_) => Self::Unauthenticated,
            FieldSyncError::Config(message)
            | FieldSyncError::NotFound(message)
            | FieldSyncError::InvalidInput(message)
            | FieldSyncError::Internal(message) => Self::Submission(message),
        }
    }
}
