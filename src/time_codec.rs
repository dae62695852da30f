//! Conversions between UNIX epoch seconds and ISO-8601 UTC timestamps.
//!
//! Epoch-derived timestamps are rendered at whole-second precision with an
//! explicit `+00:00` offset (`2024-01-01T12:00:00+00:00`). "Now" timestamps keep
//! microsecond precision.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("malformed timestamp: {0:?}")]
    MalformedTimestamp(String),
    #[error("epoch seconds out of range: {0}")]
    OutOfRange(i64),
}

/// Convert UNIX epoch seconds to an ISO-8601 UTC string.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] if the instant cannot be represented.
pub fn epoch_to_iso(seconds: i64) -> Result<String, TimeError> {
    DateTime::from_timestamp(seconds, 0)
        .map(to_iso_seconds)
        .ok_or(TimeError::OutOfRange(seconds))
}

/// Convert an ISO-8601 timestamp to UNIX epoch seconds.
///
/// Accepts a trailing `Z`, an explicit numeric offset, or no offset at all
/// (read as UTC).
///
/// # Errors
///
/// Returns [`TimeError::MalformedTimestamp`] if the input cannot be parsed.
pub fn iso_to_epoch(iso: &str) -> Result<i64, TimeError> {
    let trimmed = iso.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp());
    }

    trimmed
        .parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc().timestamp())
        .map_err(|_| TimeError::MalformedTimestamp(iso.to_string()))
}

/// Current instant as an ISO-8601 UTC string.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Current instant as UNIX epoch seconds.
#[must_use]
pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Render an instant at whole-second precision.
#[must_use]
pub fn to_iso_seconds(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}
