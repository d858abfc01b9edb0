//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file if present (existing variables win)
//! 2. Attempts to load from environment variables
//! 3. If `STAGESYNC_OAUTH_CLIENT_ID` is not set, falls back to a file
//! 4. Probes multiple paths for config files (JSON and TOML)
//! 5. With no file anywhere, uses built-in defaults
//!
//! ## Environment Variables
//! - `STAGESYNC_OAUTH_CLIENT_ID`: OAuth client id (required for env loading)
//! - `STAGESYNC_OAUTH_CLIENT_SECRET`: OAuth client secret
//! - `STAGESYNC_OAUTH_TOKEN_ENDPOINT`: Token endpoint URL
//! - `STAGESYNC_OAUTH_REFRESH_THRESHOLD_SECONDS`: Early refresh margin
//! - `STAGESYNC_CALENDAR_API_BASE_URL`: Calendar API base URL
//! - `STAGESYNC_CALENDAR_ID`: Calendar to write events to
//! - `STAGESYNC_CALENDAR_TIMEOUT_SECS`: Per-request timeout
//! - `STAGESYNC_CALENDAR_MAX_ATTEMPTS`: Attempts per request, retries included
//! - `STAGESYNC_CALENDAR_BACKOFF_MS`: Base retry backoff
//! - `STAGESYNC_SYNC_CONFLICT_WINDOW_DAYS`: Default conflict window
//! - `STAGESYNC_SYNC_CONFLICT_PAGE_SIZE`: External events fetched per check
//! - `STAGESYNC_SYNC_MAX_CONCURRENCY`: Batch worker count
//! - `STAGESYNC_SYNC_STALE_AFTER_DAYS`: Health staleness limit
//! - `STAGESYNC_SYNC_COVERAGE_THRESHOLD`: Health coverage threshold (percent)
//! - `STAGESYNC_SYNC_TIME_ZONE`: IANA zone for event descriptions
//! - `STAGESYNC_LOG_LEVEL`: Default log filter
//! - `STAGESYNC_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./stagesync.{json,toml}` or `./config.{json,toml}` (current working
//!    directory)
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use stagesync_domain::{Config, Result, StageSyncError};

use crate::errors::InfraError;

const FILE_NAMES: [&str; 4] = ["stagesync.json", "stagesync.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `StageSyncError::Config` if an environment value or a found file
/// is invalid.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    if env_opt("STAGESYNC_OAUTH_CLIENT_ID").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!("STAGESYNC_OAUTH_CLIENT_ID not set, trying file");
    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::warn!("No configuration source found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `STAGESYNC_OAUTH_CLIENT_ID` must be present; every other variable is
/// optional and overrides the default.
///
/// # Errors
/// Returns `StageSyncError::Config` if the client id is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.oauth.client_id = env_var("STAGESYNC_OAUTH_CLIENT_ID")?;
    config.oauth.client_secret = std::env::var("STAGESYNC_OAUTH_CLIENT_SECRET").ok();
    if let Some(endpoint) = env_opt("STAGESYNC_OAUTH_TOKEN_ENDPOINT") {
        config.oauth.token_endpoint = endpoint;
    }
    if let Some(seconds) = env_parse("STAGESYNC_OAUTH_REFRESH_THRESHOLD_SECONDS")? {
        config.oauth.refresh_threshold_seconds = seconds;
    }

    if let Some(base_url) = env_opt("STAGESYNC_CALENDAR_API_BASE_URL") {
        config.calendar.api_base_url = base_url;
    }
    if let Some(calendar_id) = env_opt("STAGESYNC_CALENDAR_ID") {
        config.calendar.calendar_id = calendar_id;
    }
    if let Some(timeout) = env_parse("STAGESYNC_CALENDAR_TIMEOUT_SECS")? {
        config.calendar.request_timeout_secs = timeout;
    }
    if let Some(attempts) = env_parse("STAGESYNC_CALENDAR_MAX_ATTEMPTS")? {
        config.calendar.max_attempts = attempts;
    }
    if let Some(backoff) = env_parse("STAGESYNC_CALENDAR_BACKOFF_MS")? {
        config.calendar.base_backoff_ms = backoff;
    }

    if let Some(days) = env_parse("STAGESYNC_SYNC_CONFLICT_WINDOW_DAYS")? {
        config.sync.conflict_window_days = days;
    }
    if let Some(size) = env_parse("STAGESYNC_SYNC_CONFLICT_PAGE_SIZE")? {
        config.sync.conflict_page_size = size;
    }
    if let Some(workers) = env_parse("STAGESYNC_SYNC_MAX_CONCURRENCY")? {
        config.sync.max_concurrency = workers;
    }
    if let Some(days) = env_parse("STAGESYNC_SYNC_STALE_AFTER_DAYS")? {
        config.sync.stale_after_days = days;
    }
    if let Some(percent) = env_parse("STAGESYNC_SYNC_COVERAGE_THRESHOLD")? {
        config.sync.coverage_threshold_percent = percent;
    }
    if let Some(zone) = env_opt("STAGESYNC_SYNC_TIME_ZONE") {
        config.sync.display_time_zone = zone;
    }

    if let Some(level) = env_opt("STAGESYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("STAGESYNC_LOG_JSON", config.logging.json);

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `StageSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StageSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            StageSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StageSyncError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StageSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(StageSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Reject values the engine cannot work with.
fn validate(config: &Config) -> Result<()> {
    let sync = &config.sync;
    if sync.conflict_window_days <= 0 {
        return Err(StageSyncError::Config("conflict_window_days must be positive".into()));
    }
    if sync.conflict_page_size == 0 {
        return Err(StageSyncError::Config("conflict_page_size must be positive".into()));
    }
    if sync.coverage_threshold_percent > 100 {
        return Err(StageSyncError::Config(format!(
            "coverage_threshold_percent must be at most 100, got {}",
            sync.coverage_threshold_percent
        )));
    }
    url::Url::parse(&config.calendar.api_base_url).map_err(|e| {
        StageSyncError::Config(format!("Invalid calendar api_base_url: {}", e))
    })?;
    Ok(())
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend(exe_dir.ancestors().take(3).map(Path::to_path_buf));
        }
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        StageSyncError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Non-empty environment variable, if set.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| StageSyncError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
