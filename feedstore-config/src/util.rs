use std::str::FromStr;
use std::time::Duration;

use crate::ConfigLoadError;

/// Parse a boolean value from a raw string, accepting common env-style forms.
///
/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"on"`.
/// Accepted falsy values: `"0"`, `"false"`, `"no"`, `"off"`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_bool_setting(
    key: &'static str,
    raw: &str,
) -> Result<bool, ConfigLoadError> {
    parse_bool(raw)
        .ok_or_else(|| ConfigLoadError::invalid(key, raw, "expected a boolean"))
}

pub fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigLoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigLoadError::invalid(key, raw, e))
}

/// Parses a humantime duration. `none`, `off` and `0` disable the timeout.
pub fn parse_optional_duration(
    key: &'static str,
    raw: &str,
) -> Result<Option<Duration>, ConfigLoadError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" | "off" | "0" => Ok(None),
        trimmed => humantime::parse_duration(trimmed)
            .map(Some)
            .map_err(|e| ConfigLoadError::invalid(key, raw, e)),
    }
}

pub fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim())
        .map_err(|e| ConfigLoadError::invalid(key, raw, e))
}
