//! Timestamp parsing and elapsed-time helpers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const OFFSET_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f%:z",
  "%Y-%m-%d %H:%M:%S%.f%:z",
  "%Y-%m-%dT%H:%M:%S%.f%z",
  "%Y-%m-%dT%H:%M%:z",
  "%Y-%m-%d %H:%M%:z",
];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an ISO-8601 timestamp to UTC.
///
/// A trailing `Z` is read as `+00:00`. Timestamps without an offset are taken
/// as UTC, and a bare date means midnight UTC. Returns `None` for anything else.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  let s = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
    Some(head) => format!("{}+00:00", head),
    None => s.to_string(),
  };

  if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in OFFSET_FORMATS {
    if let Ok(dt) = DateTime::parse_from_str(&s, fmt) {
      return Some(dt.with_timezone(&Utc));
    }
  }
  for fmt in NAIVE_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(&s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Parse an optional field; absent and malformed are the same case.
pub fn parse_opt(s: Option<&str>) -> Option<DateTime<Utc>> {
  s.and_then(parse)
}

/// Signed elapsed seconds from `start` to `end`, with microsecond precision.
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
  let delta = end - start;
  match delta.num_microseconds() {
    Some(us) => us as f64 / 1_000_000.0,
    None => delta.num_seconds() as f64,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn zulu_suffix_is_utc() {
    let t = parse("2024-01-01T12:00:00Z").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
  }

  #[test]
  fn explicit_offset_is_converted() {
    let t = parse("2024-01-01T14:00:00+02:00").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
  }

  #[test]
  fn minutes_without_seconds() {
    let t = parse("2024-01-01T00:00Z").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let t = parse("2024-01-01T09:30+02:00").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap());
    assert!(parse("2024-01-01T09:30").is_some());
  }

  #[test]
  fn naive_timestamp_is_utc() {
    let t = parse("2024-03-05T08:30:15.250000").unwrap();
    assert_eq!(t.timestamp_millis(), Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 15).unwrap().timestamp_millis() + 250);
    assert!(parse("2024-03-05 08:30:15").is_some());
  }

  #[test]
  fn bare_date_is_midnight() {
    let t = parse("2024-02-29").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
  }

  #[test]
  fn garbage_is_rejected() {
    assert!(parse("").is_none());
    assert!(parse("not-a-date").is_none());
    assert!(parse("2024-13-01T00:00:00Z").is_none());
    assert!(parse_opt(None).is_none());
  }

  #[test]
  fn elapsed_seconds_are_signed() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
    assert_eq!(seconds_between(a, b), 3600.0);
    assert_eq!(seconds_between(b, a), -3600.0);
  }
}
