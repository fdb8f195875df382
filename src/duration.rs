//! Parsing for human-readable durations like "2s", "500ms", "5m".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

/// Parse a duration string like "500ms", "2s", "5m", "1h".
///
/// The input is case-insensitive and whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use guichet::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(5 * 60));
/// assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(60 * 60));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    // "ms" must be tried before "m" and "s".
    let (num, unit_millis) = if let Some(num) = s.strip_suffix("ms") {
        (num, 1u64)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1_000)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60_000)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 60 * 60_000)
    } else {
        anyhow::bail!("Duration must end with ms, s, m, or h");
    };

    let num: u64 = num
        .trim()
        .parse()
        .with_context(|| "Invalid number in duration")?;

    let millis = num.checked_mul(unit_millis).context("Duration is too large")?;

    Ok(Duration::from_millis(millis))
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}
