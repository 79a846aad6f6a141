//! Logging setup for applications built on the SDK.
//!
//! Structured logging is controlled by environment variables:
//!
//! - `XATA_DEBUG=true|1|yes` - enable debug logging
//! - `XATA_LOG_LEVEL=trace|debug|info|warn|error` - set a specific level
//! - `XATA_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Nothing is installed unless one of the first two is set, or a level is
//! passed explicitly to [`init_with_level`]. Installing the subscriber needs
//! the `tracing-subscriber` feature; without it logging stays silent unless
//! the application sets up its own subscriber.
//!
//! Within the workspace, use the standard tracing macros:
//!
//! ```rust,ignore
//! use tracing::{debug, info, warn};
//!
//! debug!(cursor = ?cursor, "Fetching history page");
//! info!(branch = %branch, pushed = count, "Push complete");
//! warn!(id = %id, "Local parent link disagrees with ledger order");
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `XATA_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("XATA_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Normalize a level name, falling back when it is not recognized.
fn parse_level(level: &str, fallback: &'static str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => fallback,
    }
}

/// Get the configured log level from `XATA_LOG_LEVEL`.
///
/// Defaults to "debug" if `XATA_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    env::var("XATA_LOG_LEVEL")
        .map(|level| parse_level(&level, fallback))
        .unwrap_or(fallback)
}

/// Get the configured log format from `XATA_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("XATA_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize logging from the environment. Subsequent calls are no-ops.
pub fn init() {
    if !is_debug_enabled() && env::var("XATA_LOG_LEVEL").is_err() {
        return;
    }
    install(get_log_level());
}

/// Initialize logging at an explicit level, ignoring `XATA_LOG_LEVEL`.
pub fn init_with_level(level: &str) {
    install(parse_level(level, "warn"));
}

fn install(level: &'static str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "xata={},xata_client={},xata_migrate={},xata_cli={}",
                level, level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            match get_log_format() {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json().with_writer(std::io::stderr))
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact().with_writer(std::io::stderr))
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty().with_writer(std::io::stderr))
                        .init();
                }
            }

            tracing::info!(level = level, format = get_log_format(), "Logging initialized");
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = level;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG", "warn"), "debug");
        assert_eq!(parse_level("verbose", "warn"), "warn");
        assert_eq!(parse_level("error", "info"), "error");
    }

    #[test]
    fn test_log_level_default() {
        // SAFETY: Test runs in isolation
        unsafe {
            env::remove_var("XATA_DEBUG");
            env::remove_var("XATA_LOG_LEVEL");
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
    }
}
