//! Environment lookups shared by every service config.
//!
//! Each service keeps its own `XConfig::from_env()`; these helpers only
//! remove the repeated `std::env::var(..).ok().and_then(..)` chains.

use std::str::FromStr;
use std::time::Duration;

/// Read a required env var.
///
/// # Panics
///
/// Panics with the variable name if it is unset. Intended for startup only.
pub fn required(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("missing required env var {key}"))
}

/// Read and parse an env var, falling back to `default` when unset or unparsable.
pub fn or_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read an env var holding milliseconds.
pub fn millis_or(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(or_default(key, default_ms))
}

/// Read an env var holding seconds.
pub fn secs_or(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(or_default(key, default_secs))
}
