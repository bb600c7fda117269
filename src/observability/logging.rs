//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Gate dispatcher diagnostics behind the `silence` switch
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level
//! - Embedders install their own subscriber; the library never does

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let default_filter = format!(
        "api_mock_sniffer={level},tower_http={level}",
        level = config.log_level
    );

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Emit a tracing event unless the first argument is true.
macro_rules! notice {
    ($silent:expr, $level:ident, $($arg:tt)+) => {
        if !$silent {
            ::tracing::$level!($($arg)+);
        }
    };
}

pub(crate) use notice;
