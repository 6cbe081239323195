//! Timestamp normalization
//!
//! The RockGymPro API returns dates as local wall-clock strings
//! (`2025-06-01 12:00:00`) and uses `0000-00-00 00:00:00` for events that
//! never happened (e.g. a booking that was never cancelled).
//!
//! This module turns those strings into timezone-aware instants:
//!
//! - [`normalize`] attaches a timezone, defaulting to UTC
//! - [`normalize_transaction`] requires the facility timezone, for
//!   transactional fields (invoices, payments) stored in facility-local time
//! - [`to_iso`] renders an instant for output records

use crate::error::{Error, Result};
use crate::types::{JsonValue, Timestamp};
use chrono::{DateTime, Duration, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Sentinel the API uses for "no such event yet"
pub const ZERO_DATE: &str = "0000-00-00 00:00:00";

/// Wall-clock format used by the API for dates and for URL filters
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an API date string and attach `tz` (UTC when `None`).
///
/// Returns `Ok(None)` for the zero date, an empty string, or a missing value.
/// Any other string that does not match [`DATE_FORMAT`] is an error.
pub fn normalize(raw: Option<&str>, tz: Option<Tz>) -> Result<Option<DateTime<Tz>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_empty() || raw == ZERO_DATE {
        return Ok(None);
    }

    let naive = NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| Error::timestamp(raw, e.to_string()))?;

    Ok(Some(localize(&naive, tz.unwrap_or(Tz::UTC))))
}

/// Parse a facility-local transactional date string.
///
/// Same rules as [`normalize`], but the facility timezone is mandatory so
/// that instants compare correctly against bookmarks.
pub fn normalize_transaction(raw: Option<&str>, tz: Tz) -> Result<Option<DateTime<Tz>>> {
    normalize(raw, Some(tz))
}

/// Normalize a JSON field value. `null` behaves like a missing field.
pub fn normalize_value(value: Option<&JsonValue>, tz: Option<Tz>) -> Result<Option<DateTime<Tz>>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => normalize(Some(s.as_str()), tz),
        Some(other) => Err(Error::timestamp(
            other.to_string(),
            "expected a date string",
        )),
    }
}

/// Render an instant as RFC 3339 with a numeric offset
/// (`2025-06-01T12:00:00+00:00`).
pub fn to_iso<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse an RFC 3339 string back into a UTC instant
pub fn parse_iso(raw: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::timestamp(raw, e.to_string()))
}

/// Render a bookmark as facility-local wall-clock time for URL filters
pub fn format_filter(ts: &Timestamp, tz: Tz) -> String {
    ts.with_timezone(&tz).format(DATE_FORMAT).to_string()
}

/// Attach a timezone to a wall-clock time.
///
/// Ambiguous times (clocks falling back) resolve to the standard-time
/// instant. Times inside a spring-forward gap are read with the offset in
/// effect before the gap.
fn localize(naive: &NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(_, standard) => standard,
        chrono::LocalResult::None => {
            let offset = tz
                .offset_from_utc_datetime(&(*naive - Duration::days(1)))
                .fix();
            let utc = *naive - Duration::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&utc).with_timezone(&tz)
        }
    }
}
