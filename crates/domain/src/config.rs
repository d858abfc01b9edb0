//! Configuration structures
//!
//! Every section is defaulted so a partial TOML/JSON file (or none at all)
//! still yields a usable configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALENDAR_ID, DEFAULT_CONFLICT_PAGE_SIZE, DEFAULT_CONFLICT_WINDOW_DAYS,
    DEFAULT_COVERAGE_THRESHOLD_PERCENT, DEFAULT_DISPLAY_TIME_ZONE, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_STALE_AFTER_DAYS, GOOGLE_CALENDAR_API_BASE, GOOGLE_TOKEN_ENDPOINT,
};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncSettings,
    pub calendar: CalendarSettings,
    pub oauth: OAuthSettings,
    pub logging: LoggingConfig,
}

/// Tunables for the sync engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Length of the default conflict window, starting now.
    pub conflict_window_days: i64,
    /// Maximum number of external events fetched for one conflict check.
    pub conflict_page_size: usize,
    /// Worker count for batch sync and per-target fan-out.
    pub max_concurrency: usize,
    /// A last sync older than this is reported by the health check.
    pub stale_after_days: i64,
    /// Sync coverage strictly below this percentage is reported.
    pub coverage_threshold_percent: u8,
    /// IANA zone used to render dates in event descriptions.
    pub display_time_zone: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            conflict_window_days: DEFAULT_CONFLICT_WINDOW_DAYS,
            conflict_page_size: DEFAULT_CONFLICT_PAGE_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            coverage_threshold_percent: DEFAULT_COVERAGE_THRESHOLD_PERCENT,
            display_time_zone: DEFAULT_DISPLAY_TIME_ZONE.to_string(),
        }
    }
}

impl SyncSettings {
    /// Worker count clamped to at least one.
    pub fn workers(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

/// External calendar API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub api_base_url: String,
    pub calendar_id: String,
    pub request_timeout_secs: u64,
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            api_base_url: GOOGLE_CALENDAR_API_BASE.to_string(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            request_timeout_secs: 30,
            max_attempts: 3,
            base_backoff_ms: 200,
        }
    }
}

/// OAuth client settings used to refresh access tokens
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    /// Tokens expiring within this many seconds are refreshed early.
    pub refresh_threshold_seconds: i64,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            client_id: String::new(),
            client_secret: None,
            refresh_threshold_seconds: 300,
        }
    }
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("refresh_threshold_seconds", &self.refresh_threshold_seconds)
            .finish()
    }
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
