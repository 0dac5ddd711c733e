//! Tracing setup.
//!
//! The filter sits behind a reload layer: logging starts before the config
//! file is read and the configured level is swapped in afterwards. A valid
//! `RUST_LOG` keeps precedence over the configured level.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Where the active filter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSource {
    /// `RUST_LOG` parsed and stays in charge.
    Env,
    /// `RUST_LOG` unset; the configured level applies.
    Config,
    /// `RUST_LOG` was rejected; the configured level applies.
    InvalidEnv { value: String, error: String },
}

struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    source: FilterSource,
}

static LOG_CONTROL: OnceLock<LogControl> = OnceLock::new();

/// Pick the startup filter from the `RUST_LOG` value and a fallback level.
pub fn resolve_filter(rust_log: Option<&str>, level: &str) -> (EnvFilter, FilterSource) {
    match rust_log.filter(|raw| !raw.trim().is_empty()) {
        None => (EnvFilter::new(level), FilterSource::Config),
        Some(raw) => match EnvFilter::try_new(raw) {
            Ok(filter) => (filter, FilterSource::Env),
            Err(e) => (
                EnvFilter::new(level),
                FilterSource::InvalidEnv {
                    value: raw.to_string(),
                    error: e.to_string(),
                },
            ),
        },
    }
}

pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, source) = resolve_filter(rust_log.as_deref(), level);
    let (reload_layer, handle) = reload::Layer::new(filter);

    if let Err(e) = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init()
    {
        tracing::debug!(error = %e, "global subscriber already installed, keeping it");
        return;
    }

    if let FilterSource::InvalidEnv { value, error } = &source {
        tracing::warn!(rust_log = %value, %error, level, "ignoring invalid RUST_LOG");
    }
    let _ = LOG_CONTROL.set(LogControl { handle, source });
}

/// Apply the configured logging level, unless a valid `RUST_LOG` is in charge.
pub fn apply_logging_level(level: &str) {
    let Some(control) = LOG_CONTROL.get() else {
        return;
    };
    if control.source == FilterSource::Env {
        tracing::debug!(level, "RUST_LOG set, configured level not applied");
        return;
    }
    match control.handle.modify(|f| *f = EnvFilter::new(level)) {
        Ok(()) => tracing::debug!(level, "logging level applied"),
        Err(e) => tracing::warn!(error = %e, level, "failed to apply logging level"),
    }
}
