//! Date wire format.
//!
//! The backend accepts timestamps in exactly one shape: UTC, RFC 3339,
//! millisecond precision, `Z` suffix (`2024-03-01T12:00:00.000Z`). Every date
//! that crosses the adapter is normalized to that shape. Sub-second precision
//! is dropped, so the fractional part is always `.000`.

use crate::{Error, Result};
use chrono::{
    DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc,
};

/// Naive formats accepted by [`decode`], interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encodes an instant in the canonical wire format.
///
/// # Examples
///
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use spanner_bridge::dates::encode;
///
/// let berlin = FixedOffset::east_opt(3600).unwrap();
/// let local = berlin.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap();
/// assert_eq!(encode(&local), "2024-03-01T12:00:00.000Z");
/// ```
#[must_use]
pub fn encode<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&Utc)
        .trunc_subsecs(0)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Encodes the current time in the canonical wire format.
#[must_use]
pub fn encode_now() -> String {
    encode(&Utc::now())
}

/// Normalizes a date/time string to the canonical wire format.
///
/// Empty (or all-whitespace) input yields an empty string. Otherwise the input
/// may be RFC 3339 with any offset, a naive `YYYY-MM-DD HH:MM:SS` (optionally
/// with `T` and fractional seconds, read as UTC), a bare `YYYY-MM-DD`
/// (midnight UTC), or an integer Unix timestamp in seconds.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the input matches none of those shapes.
///
/// # Examples
///
/// ```
/// use spanner_bridge::dates::decode;
///
/// assert_eq!(decode("").unwrap(), "");
/// assert_eq!(decode("2024-03-01 12:00:00").unwrap(), "2024-03-01T12:00:00.000Z");
/// assert_eq!(decode("2024-03-01T14:00:00+02:00").unwrap(), "2024-03-01T12:00:00.000Z");
/// ```
pub fn decode(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    parse(trimmed).map(|instant| encode(&instant))
}

/// Formats a date for a `TIMESTAMP` or `DATE` column.
///
/// Empty input yields `None`, which callers bind as SQL `NULL`. With
/// `include_time` the canonical wire format is returned; without it the
/// `YYYY-MM-DD` form used by `DATE` columns.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the input cannot be parsed.
pub fn format_date(input: &str, include_time: bool) -> Result<Option<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let instant = parse(trimmed)?;
    if include_time {
        Ok(Some(encode(&instant)))
    } else {
        Ok(Some(instant.format(DATE_FORMAT).to_string()))
    }
}

/// Parses any accepted input shape into a UTC instant.
fn parse(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_FORMAT) {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| Error::InvalidInput(format!("timestamp out of range: {input}")));
    }

    Err(Error::InvalidInput(format!("unrecognized date: {input}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use test_case::test_case;

    #[test]
    fn test_encode_utc() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(encode(&instant), "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_encode_truncates_subseconds() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(987);
        assert_eq!(encode(&instant), "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_encode_converts_offsets() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 2, 29, 22, 30, 0).unwrap();
        assert_eq!(encode(&local), "2024-03-01T03:30:00.000Z");
    }

    #[test]
    fn test_encode_now_shape() {
        let now = encode_now();
        assert!(now.ends_with(".000Z"));
        assert_eq!(now.len(), 24);
    }

    #[test_case("", ""; "empty")]
    #[test_case("   ", ""; "whitespace")]
    #[test_case("2024-03-01T12:00:00Z", "2024-03-01T12:00:00.000Z"; "rfc3339 zulu")]
    #[test_case("2024-03-01T12:00:00+00:00", "2024-03-01T12:00:00.000Z"; "rfc3339 zero offset")]
    #[test_case("2024-03-01T12:00:00.456789Z", "2024-03-01T12:00:00.000Z"; "rfc3339 micros")]
    #[test_case("2024-03-01 12:00:00", "2024-03-01T12:00:00.000Z"; "naive with space")]
    #[test_case("2024-03-01T12:00:00", "2024-03-01T12:00:00.000Z"; "naive with t")]
    #[test_case("2024-03-01 12:00:00.5", "2024-03-01T12:00:00.000Z"; "naive fractional")]
    #[test_case("2024-03-01", "2024-03-01T00:00:00.000Z"; "date only")]
    #[test_case("1709294400", "2024-03-01T12:00:00.000Z"; "unix seconds")]
    fn test_decode(input: &str, expected: &str) {
        assert_eq!(decode(input).unwrap(), expected);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("next tuesday"), Err(Error::InvalidInput(_))));
        assert!(matches!(decode("2024-13-01"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("", true).unwrap(), None);
        assert_eq!(
            format_date("2024-03-01 23:59:59", false).unwrap().as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(
            format_date("2024-03-01 23:59:59", true).unwrap().as_deref(),
            Some("2024-03-01T23:59:59.000Z")
        );
    }
}
