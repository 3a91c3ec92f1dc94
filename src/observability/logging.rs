//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level
//! - Safe to call more than once (later calls are ignored)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor a config level is set.
pub const DEFAULT_FILTER: &str = "route_registry=debug,tower_http=debug";

/// Build the filter from `RUST_LOG`, falling back to `level` for this crate.
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        Some(level) => format!("route_registry={level},tower_http={level}").into(),
        None => DEFAULT_FILTER.into(),
    })
}

/// Initialize the global tracing subscriber.
pub fn init(level: Option<&str>) {
    let result = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
