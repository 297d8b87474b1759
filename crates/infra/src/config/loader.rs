//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `FIELDSYNC_DB_PATH`: Database file path
//! - `FIELDSYNC_DB_POOL_SIZE`: Connection pool size
//! - `FIELDSYNC_API_BASE_URL`: Remote authority base URL
//! - `FIELDSYNC_API_TIMEOUT`: API request timeout in seconds
//! - `FIELDSYNC_SYNC_MAX_CONCURRENCY`: Concurrent submissions per pass
//! - `FIELDSYNC_SYNC_SUBMISSION_TIMEOUT`: Per-record submission timeout in
//!   seconds
//! - `FIELDSYNC_SYNC_PROBE_INTERVAL`: Connectivity probe interval in seconds
//! - `FIELDSYNC_SYNC_ENABLED`: Whether automatic sync is enabled (true/false)
//!
//! The sync variables are optional and default to [`SyncConfig::default`].

use std::path::{Path, PathBuf};

use fieldsync_domain::{
    ApiConfig, Config, DatabaseConfig, FieldSyncError, Result, SyncConfig,
};

/// Load configuration with automatic fallback strategy.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// The database and API variables are required; sync variables fall back to
/// their defaults.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("FIELDSYNC_DB_PATH")?;
    let db_pool_size = env_var("FIELDSYNC_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| FieldSyncError::Config(format!("Invalid pool size: {e}")))
    })?;

    let api_base_url = env_var("FIELDSYNC_API_BASE_URL")?;
    let api_timeout = env_var("FIELDSYNC_API_TIMEOUT").and_then(|s| {
        s.parse::<u64>().map_err(|e| FieldSyncError::Config(format!("Invalid API timeout: {e}")))
    })?;

    let defaults = SyncConfig::default();
    let sync = SyncConfig {
        max_concurrency: env_parse("FIELDSYNC_SYNC_MAX_CONCURRENCY", defaults.max_concurrency)?,
        submission_timeout_seconds: env_parse(
            "FIELDSYNC_SYNC_SUBMISSION_TIMEOUT",
            defaults.submission_timeout_seconds,
        )?,
        probe_interval_seconds: env_parse(
            "FIELDSYNC_SYNC_PROBE_INTERVAL",
            defaults.probe_interval_seconds,
        )?,
        enabled: env_bool("FIELDSYNC_SYNC_ENABLED", defaults.enabled),
    };

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        api: ApiConfig { base_url: api_base_url, timeout_seconds: api_timeout },
        sync,
    })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FieldSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FieldSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FieldSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FieldSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FieldSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FieldSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe standard locations for a config file, nearest first.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("fieldsync.json"),
            cwd.join("fieldsync.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("fieldsync.json"),
                exe_dir.join("fieldsync.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FieldSyncError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| FieldSyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable.
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
