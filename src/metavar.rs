//! Environment variables controlling library behavior, mostly for
//! development and testing.

use log::{LevelFilter, warn};
use std::env;

/// Makes tests of unfinished functionality fail instead of pass when set
/// to a non-empty value other than `0`. Read by test harnesses, not by
/// the library.
pub const FAIL_INCOMPLETE_TESTS_ENVAR: &str = "PHYLOSPLIT_FAIL_INCOMPLETE_TESTS";

/// Maximum log level: `off`, `error`, `warn`, `info`, `debug` or `trace`.
pub const LOGGING_LEVEL_ENVAR: &str = "PHYLOSPLIT_LOGGING_LEVEL";

/// Log line format for loggers installed by tools built on this crate.
/// The library itself installs no logger and never reads it.
pub const LOGGING_FORMAT_ENVAR: &str = "PHYLOSPLIT_LOGGING_FORMAT";

/// Parses a log level name (case-insensitive).
pub fn parse_logging_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

/// Reads the maximum log level from [LOGGING_LEVEL_ENVAR], `None` if the
/// variable is unset or not a level name.
pub fn logging_level_from_env() -> Option<LevelFilter> {
    let value = env::var(LOGGING_LEVEL_ENVAR).ok()?;
    let level = parse_logging_level(&value);
    if level.is_none() {
        warn!("Ignoring {}='{}': not a log level", LOGGING_LEVEL_ENVAR, value);
    }
    level
}

/// Sets [log::set_max_level] from [LOGGING_LEVEL_ENVAR], if set. Returns the
/// level applied.
pub fn apply_logging_level_from_env() -> Option<LevelFilter> {
    let level = logging_level_from_env()?;
    log::set_max_level(level);
    Some(level)
}
