//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber once
//! - Honour `RUST_LOG` first, then the configured log level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - tower_http events follow the configured level too

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive set for a configured level such as `"debug"`.
pub fn default_directives(level: &str) -> String {
    format!("route_dispatch={level},tower_http={level}")
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(level).into()))
        .with(fmt::layer())
        .try_init()
}
