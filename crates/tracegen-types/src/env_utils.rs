//! Environment variable parsing utilities.
//!
//! Small helpers used by the configuration layer to read optional overrides
//! without repeating the `var().ok().map(parse)` chain everywhere.
//!
//! # Example
//!
//! ```
//! use tracegen_types::env_utils::env_var;
//!
//! let threads: Result<Option<usize>, String> = env_var("TRACEGEN_THREADS_DOC");
//! assert_eq!(threads, Ok(None));
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `Ok(None)` if the variable is unset or blank, and the raw value
/// as the error if it is set but does not parse.
pub fn env_var<T: FromStr>(key: &str) -> Result<Option<T>, String> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(|_| raw),
        _ => Ok(None),
    }
}

/// Check if an environment variable is set to a truthy value.
///
/// Returns `true` if the variable is set to "1", "true", "yes", or "on" (case-insensitive).
pub fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
