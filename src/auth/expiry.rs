/// Expiry duration parsing
///
/// Token lifetimes are configured as human-readable strings such as "15m"
/// or "7d". The grammar is a single integer amount followed by one unit;
/// combined forms like "1h30m" are rejected. Failures here are fatal
/// configuration errors surfaced at startup, not per-request conditions.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ConfigError;

lazy_static! {
    static ref EXPIRY_REGEX: Regex = Regex::new(r"^(\d+)([a-zA-Z]+)$").unwrap();
}

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Parses a duration string into milliseconds.
///
/// Supported units: `s` (seconds), `m` (minutes), `h` (hours), `d` (days).
pub fn parse_expiry(raw: &str) -> Result<i64, ConfigError> {
    let captures = EXPIRY_REGEX
        .captures(raw.trim())
        .ok_or_else(|| ConfigError::InvalidExpiry(raw.to_string()))?;

    let amount: i64 = captures[1]
        .parse()
        .map_err(|_| ConfigError::InvalidExpiry(raw.to_string()))?;

    let unit_ms = match &captures[2] {
        "s" => MILLIS_PER_SECOND,
        "m" => MILLIS_PER_MINUTE,
        "h" => MILLIS_PER_HOUR,
        "d" => MILLIS_PER_DAY,
        _ => return Err(ConfigError::UnsupportedUnit(raw.to_string())),
    };

    amount
        .checked_mul(unit_ms)
        .ok_or_else(|| ConfigError::InvalidExpiry(raw.to_string()))
}
