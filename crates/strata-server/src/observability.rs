//! Tracing setup.
//!
//! The subscriber is installed once at startup with a default filter, then
//! re-pointed at the configured level after the configuration is loaded.
//! `RUST_LOG`, when set, wins over both.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

/// Installs the global subscriber at `info`.
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_tracing_with_level(level: &str) {
    let filter = env_override().unwrap_or_else(|| EnvFilter::new(level));
    let (filter_layer, handle) = reload::Layer::new(filter);
    if FILTER_HANDLE.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Applies the configured level unless `RUST_LOG` overrides it.
pub fn apply_logging(config: &LoggingConfig) {
    if env_override().is_some() {
        tracing::debug!("RUST_LOG set; ignoring logging.level");
        return;
    }
    let filter = match EnvFilter::try_new(&config.level) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::warn!(
                level = %config.level,
                error = %e,
                "Invalid logging.level; keeping current filter"
            );
            return;
        }
    };
    if let Some(handle) = FILTER_HANDLE.get()
        && let Err(e) = handle.reload(filter)
    {
        tracing::warn!(error = %e, "Failed to apply logging level");
    }
}

fn env_override() -> Option<EnvFilter> {
    std::env::var_os("RUST_LOG")?;
    EnvFilter::try_from_default_env().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_levels_parse_as_filters() {
        for level in ["trace", "debug", "info", "warn", "error", "off"] {
            assert!(EnvFilter::try_new(level).is_ok(), "{level}");
        }
    }
}
