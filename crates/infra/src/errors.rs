//! Infrastructure error type and conversions into the domain error.

use fieldsync_domain::FieldSyncError;
use thiserror::Error;

/// Errors raised by infrastructure adapters before they cross into the
/// domain layer.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<InfraError> for FieldSyncError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Sqlite(e) => FieldSyncError::Database(e.to_string()),
            InfraError::Pool(e) => FieldSyncError::Database(e.to_string()),
            InfraError::Http(e) => FieldSyncError::Network(e.to_string()),
            InfraError::Serde(e) => FieldSyncError::InvalidInput(e.to_string()),
            InfraError::Join(e) => {
                if e.is_cancelled() {
                    FieldSyncError::Internal("blocking task cancelled".into())
                } else {
                    FieldSyncError::Internal(format!("blocking task panic: {e}"))
                }
            }
        }
    }
}
