//! Application configuration structures
//!
//! Populated by the infra config loader from environment variables or a
//! config file. Defaults here mirror what the loader falls back to.

use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
}

/// Local record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the remote authority (e.g. "https://api.example.org/v1")
    pub base_url: String,
    /// Timeout for API requests in seconds
    pub timeout_seconds: u64,
}

/// Sync coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of concurrent record submissions per pass
    pub max_concurrency: usize,
    /// Timeout for a single record submission in seconds
    pub submission_timeout_seconds: u64,
    /// Interval between connectivity probes in seconds
    pub probe_interval_seconds: u64,
    /// Whether automatic sync triggering is enabled
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            submission_timeout_seconds: 60,
            probe_interval_seconds: 30,
            enabled: true,
        }
    }
}
