//! Environment variable helpers shared by the per-crate `from_env` configs.
//!
//! Unset, empty, or unparseable values fall back to the provided default.

use std::str::FromStr;

/// Prefix shared by every configuration key.
pub const ENV_PREFIX: &str = "YTCLIPPER_";

fn raw(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Read `YTCLIPPER_<key>` as a string.
pub fn string(key: &str) -> Option<String> {
    raw(key)
}

/// Read `YTCLIPPER_<key>` as a string with a default.
pub fn string_or(key: &str, default: &str) -> String {
    raw(key).unwrap_or_else(|| default.to_string())
}

/// Parse `YTCLIPPER_<key>`, falling back to `default`.
pub fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    raw(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag (`true`/`1`), falling back to `default` when unset.
pub fn flag(key: &str, default: bool) -> bool {
    raw(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
        .unwrap_or(default)
}
