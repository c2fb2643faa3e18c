//! Date parsing and canonical formatting.
//!
//! Catalog records arrive with timestamps in many ISO-ish shapes. Every
//! accepted shape is first canonicalised (date and clock separators
//! restored independently, fraction separator, `T`, offset rewritten to
//! `±HHMM`) and then tried against an ordered list of patterns. The result is always a UTC instant truncated to seconds and is
//! rendered back as `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! ```
//! use catalog_core::date::{format_date, parse_date};
//!
//! let a = parse_date("2014-05-30T13:45:10Z").unwrap();
//! let b = parse_date("2014-05-30 15:45:10+2:00").unwrap();
//! let c = parse_date("20140530T084510-0500").unwrap();
//!
//! assert_eq!(a, b);
//! assert_eq!(a, c);
//! assert_eq!(format_date(&a), "2014-05-30T13:45:10Z");
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, SecondsFormat, Timelike, Utc};
use regex::Regex;

/// Patterns tried, in order, against the canonicalised input.
///
/// Every canonical string is `YYYY-MM-DDTHH:MM[:SS][.f]±HHMM`.
const OFFSET_PATTERNS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"];

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<date>\d{4}-?\d{2}-?\d{2})[Tt ](?P<time>\d{1,2}(?::?\d{2}){1,2}(?:[.,]\d+)?)\s*(?:(?P<zulu>[Zz])|(?P<sign>[+-])(?P<hours>\d{1,2})(?::?(?P<minutes>\d{2}))?)?$",
    )
    .expect("timestamp pattern is valid")
});

static DATE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// Parse a date string into a UTC instant with second precision.
///
/// Returns `None` when the input is not a recognised date. Inputs without an
/// offset are read as UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if DATE_ONLY.is_match(input) {
        let day = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;
        return Some(day.and_hms_opt(0, 0, 0)?.and_utc());
    }

    let canonical = canonicalize(input)?;
    OFFSET_PATTERNS.iter().find_map(|pattern| {
        DateTime::parse_from_str(&canonical, pattern)
            .ok()
            .map(|dt| truncate_to_seconds(dt.with_timezone(&Utc)))
    })
}

/// Render an instant as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Drop sub-second precision.
pub fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Rewrite a timestamp into `YYYY-MM-DDTHH:MM[:SS][.f]±HHMM`.
///
/// Basic (`20140530`, `134510`) and extended (`2014-05-30`, `13:45:10`)
/// forms may be mixed. `Z` becomes `+0000`, `+5:30`, `+05:30`, `+530` and
/// `+05` all become `+0530` / `+0500`, and a missing offset is taken as UTC.
fn canonicalize(input: &str) -> Option<String> {
    let caps = TIMESTAMP.captures(input)?;

    let date: String = caps["date"].chars().filter(|c| *c != '-').collect();
    let (clock, fraction) = match caps["time"].split_once(['.', ',']) {
        Some((clock, fraction)) => (clock, format!(".{fraction}")),
        None => (&caps["time"], String::new()),
    };
    let clock = clock_fields(clock)?;

    let offset = if let Some(sign) = caps.name("sign") {
        let hours: u32 = caps["hours"].parse().ok()?;
        let minutes: u32 = match caps.name("minutes") {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        if hours > 23 || minutes > 59 {
            return None;
        }
        format!("{}{:02}{:02}", sign.as_str(), hours, minutes)
    } else {
        "+0000".to_string()
    };

    Some(format!(
        "{}-{}-{}T{clock}{fraction}{offset}",
        &date[..4],
        &date[4..6],
        &date[6..]
    ))
}

/// `9:05` -> `09:05`, `134510` -> `13:45:10`.
fn clock_fields(clock: &str) -> Option<String> {
    let mut digits: String = clock.chars().filter(|c| *c != ':').collect();
    if digits.len() % 2 == 1 {
        digits.insert(0, '0');
    }
    match digits.len() {
        4 => Some(format!("{}:{}", &digits[..2], &digits[2..])),
        6 => Some(format!("{}:{}:{}", &digits[..2], &digits[2..4], &digits[4..])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "2014-05-30T13:45:10Z";

    #[test]
    fn every_supported_shape_normalizes_to_one_instant() {
        let inputs = [
            "2014-05-30T13:45:10Z",
            "2014-05-30T13:45:10z",
            "2014-05-30 13:45:10Z",
            "2014-05-30T13:45:10.250Z",
            "2014-05-30T13:45:10,250Z",
            "2014-05-30T13:45:10+0000",
            "2014-05-30T13:45:10+00:00",
            "2014-05-30T15:45:10+02:00",
            "2014-05-30T15:45:10+0200",
            "2014-05-30T15:45:10+2:00",
            "2014-05-30T15:45:10+02",
            "2014-05-30T15:45:10+2",
            "2014-05-30T08:45:10-0500",
            "2014-05-30T08:45:10-5:00",
            "2014-05-30T19:15:10+530",
            "2014-05-30T13:45:10",
            "2014-05-30 13:45:10",
            "20140530T134510Z",
            "20140530T084510-0500",
            "2014-05-30T134510Z",
            "20140530T13:45:10Z",
            "20140530 15:45:10+02:00",
        ];

        for input in inputs {
            let parsed = parse_date(input).unwrap_or_else(|| panic!("failed to parse {input}"));
            assert_eq!(format_date(&parsed), CANONICAL, "input {input}");
        }
    }

    #[test]
    fn minute_precision_and_single_digit_hours() {
        let dt = parse_date("2014-05-30T9:05Z").unwrap();
        assert_eq!(format_date(&dt), "2014-05-30T09:05:00Z");
    }

    #[test]
    fn basic_clock_without_seconds() {
        let dt = parse_date("2014-05-30T0905+0000").unwrap();
        assert_eq!(format_date(&dt), "2014-05-30T09:05:00Z");
    }

    #[test]
    fn date_only_is_midnight_utc() {
        let dt = parse_date("2014-05-30").unwrap();
        assert_eq!(format_date(&dt), "2014-05-30T00:00:00Z");
    }

    #[test]
    fn rejects_non_dates() {
        for input in ["kevin", "5", "5.5", "2014", "2014-13-40T00:00:00Z", "2014-05-30T10:00:00+25:00", ""] {
            assert!(parse_date(input).is_none(), "{input} should not parse");
        }
    }

    #[test]
    fn reformatting_is_idempotent() {
        let once = format_date(&parse_date("2014-05-30 15:45:10+02:00").unwrap());
        let twice = format_date(&parse_date(&once).unwrap());
        assert_eq!(once, twice);
    }
}
