//! Logging setup.
//!
//! The hub itself only emits `tracing` events. Binaries embedding it call
//! [`init_logging`] once at startup. Output always goes to **stderr**: a host
//! that relays messages over stdio must never write logs to stdout.

use crate::config::LogSettings;
use crate::error::ConfigError;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Calling this twice is harmless;
/// the second call leaves the first subscriber in place and returns `Ok`.
pub fn init_logging(settings: &LogSettings) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.filter).map_err(|e| ConfigError::LogFilter {
            filter: settings.filter.clone(),
            reason: e.to_string(),
        })?,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(settings.ansi)
        .try_init();
    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
    Ok(())
}
