//! Log output setup
//!
//! Logs go to stderr so that command output on stdout stays parseable.

use enry_config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins when set. Otherwise `-v` flags raise the configured level
/// (warn by default).
pub fn init(verbose: u8, configured: Option<LogLevel>) {
    let level = match verbose {
        0 => configured.unwrap_or(LogLevel::Warn),
        1 => configured.map_or(LogLevel::Debug, |level| level.max(LogLevel::Debug)),
        _ => LogLevel::Trace,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
