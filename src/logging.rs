//! Tracing subscriber setup

use crate::cli::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber at `level`, unless `RUST_LOG` says otherwise.
///
/// Calling this twice is harmless; the second subscriber is dropped.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
