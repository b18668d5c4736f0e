//! Tracing subscriber setup
//!
//! Logs go to stderr so that stdout carries only CSV output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set and valid. Otherwise `default_level` is used, and
/// an unparsable `default_level` falls back to `info`.
pub fn init(default_level: &str) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| format!("Failed to install tracing subscriber: {}", e))
}
