//! Structured logging setup
//!
//! Installs a global `tracing` subscriber configured by [`LoggingConfig`].
//! `RUST_LOG` takes precedence over the configured level when it is set.

use stagesync_domain::{LoggingConfig, Result, StageSyncError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the level filter for `config`.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| StageSyncError::Config(format!("invalid log filter '{}': {e}", config.level)))
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, leaving it in
/// place.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;

    let installed = if config.json {
        let layer = fmt::layer().json().with_target(true).with_current_span(true).flatten_event(true);
        tracing_subscriber::registry().with(layer).with(filter).try_init().is_ok()
    } else {
        let layer = fmt::layer().with_target(true);
        tracing_subscriber::registry().with(layer).with(filter).try_init().is_ok()
    };

    if installed {
        tracing::info!(level = %config.level, json = config.json, "logging initialized");
    }
    Ok(installed)
}
