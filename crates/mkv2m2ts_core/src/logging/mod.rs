//! Logging infrastructure for mkv2m2ts.
//!
//! This module provides:
//! - A per-run logger with an optional transcript file
//! - Tail buffer of tool output for error diagnosis
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use mkv2m2ts_core::logging::{init_tracing, LogConfig, LogLevel, RunLogger};
//!
//! init_tracing(LogLevel::Info);
//!
//! let logger = RunLogger::with_file(LogConfig::default(), "/tmp/mkv2m2ts.log").unwrap();
//! logger.phase("Inspect");
//! logger.command("mediainfo --Output=XML movie.mkv");
//! logger.success("Conversion finished");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
        tracing::warn!("tracing initialized twice without panicking");
    }
}
