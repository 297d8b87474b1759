//! Trigger lifecycle error types

use fieldsync_domain::FieldSyncError;
use thiserror::Error;

/// Lifecycle errors for the background trigger tasks.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The task is already running
    #[error("Trigger task already running")]
    AlreadyRunning,

    /// The task is not running
    #[error("Trigger task not running")]
    NotRunning,

    /// The task panicked while being joined
    #[error("Trigger task panicked")]
    TaskPanicked,

    /// The task did not stop within the join timeout
    #[error("Trigger task did not stop within {seconds}s")]
    StopTimeout { seconds: u64 },
}

impl From<TriggerError> for FieldSyncError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::AlreadyRunning | TriggerError::NotRunning => {
                FieldSyncError::InvalidInput(err.to_string())
            }
            TriggerError::TaskPanicked | TriggerError::StopTimeout { .. } => {
                FieldSyncError::Internal(err.to_string())
            }
        }
    }
}

/// Convenience type alias for trigger lifecycle operations
pub type TriggerResult<T> = Result<T, TriggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_misuse_maps_to_invalid_input() {
        let err: FieldSyncError = TriggerError::AlreadyRunning.into();
        assert!(matches!(err, FieldSyncError::InvalidInput(_)));
    }

    #[test]
    fn stop_timeout_maps_to_internal() {
        let err: FieldSyncError = TriggerError::StopTimeout { seconds: 5 }.into();
        assert!(matches!(err, FieldSyncError::Internal(_)));
    }
}
