//! Structured logging initialization.
//!
//! Thin wrapper over `tracing-subscriber`. The configured level is the
//! default; a `RUST_LOG` environment filter always wins so operators can
//! raise verbosity without touching the config file.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Later calls are no-ops, so tests may
/// call this more than once.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
    {
        tracing::info!(app = %config.app_name, level = %config.log_level, "logging initialised");
    }
}
