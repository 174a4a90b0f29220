//! Event time intervals
//!
//! The league listing carries local start/end timestamps and an optional
//! IANA timezone label. The conversion to the declared zone happens here,
//! once, before the interval is attached to an event; after that the
//! interval is immutable.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ShapeError;

/// A closed time interval with the event's declared timezone applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Interval start, in the event's local timezone
    pub start: DateTime<FixedOffset>,
    /// Interval end, in the event's local timezone
    pub end: DateTime<FixedOffset>,
}

impl TimeInterval {
    /// Build an interval from the API's local timestamps and timezone label
    ///
    /// Accepted timestamp formats, tried in order: RFC 3339, ISO date-time
    /// without offset, bare date (midnight). A missing label means the
    /// timestamps are taken as UTC; an unrecognized label is a shape
    /// failure, as is an interval that ends before it starts.
    pub fn from_local(
        start: &str,
        end: &str,
        timezone: Option<&str>,
    ) -> Result<Self, ShapeError> {
        let zone = match timezone {
            Some(label) if !label.is_empty() => {
                label.parse::<Tz>().map_err(|_| ShapeError::UnknownTimezone {
                    label: label.to_string(),
                })?
            }
            _ => Tz::UTC,
        };

        let start = zoned(start, zone)?;
        let end = zoned(end, zone)?;
        if end < start {
            return Err(ShapeError::InvertedInterval {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }
}

/// Interpret one timestamp string in the given zone
fn zoned(value: &str, zone: Tz) -> Result<DateTime<FixedOffset>, ShapeError> {
    // Timestamps that already carry an offset are converted, not re-labeled.
    if let Ok(absolute) = DateTime::parse_from_rfc3339(value) {
        return Ok(absolute.with_timezone(&zone).fixed_offset());
    }

    let naive = parse_naive(value).ok_or_else(|| ShapeError::InvalidTimestamp {
        value: value.to_string(),
    })?;

    match zone.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.fixed_offset()),
        // DST fold: both readings are defensible, take the earlier one.
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.fixed_offset()),
        LocalResult::None => Err(ShapeError::NonexistentLocalTime {
            value: value.to_string(),
            zone: zone.name().to_string(),
        }),
    }
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Convenience for tests and diagnostics: the interval in UTC
impl TimeInterval {
    /// Interval start converted to UTC
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    /// Interval end converted to UTC
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_timezone_is_applied_to_naive_timestamps() {
        let interval = TimeInterval::from_local(
            "2024-04-08T09:00:00",
            "2024-04-10T18:00:00",
            Some("Asia/Tokyo"),
        )
        .unwrap();

        assert_eq!(interval.start.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(interval.start.to_rfc3339(), "2024-04-08T09:00:00+09:00");
        assert_eq!(interval.end.to_rfc3339(), "2024-04-10T18:00:00+09:00");
    }

    #[test]
    fn bare_dates_parse_as_local_midnight() {
        let interval =
            TimeInterval::from_local("2024-04-08", "2024-04-10", Some("Europe/Paris")).unwrap();
        assert_eq!(interval.start.to_rfc3339(), "2024-04-08T00:00:00+02:00");
    }

    #[test]
    fn missing_timezone_falls_back_to_utc() {
        let interval =
            TimeInterval::from_local("2024-04-08T09:00:00", "2024-04-08T12:00:00", None).unwrap();
        assert_eq!(interval.start.offset().local_minus_utc(), 0);
    }

    #[test]
    fn empty_timezone_label_falls_back_to_utc() {
        let interval =
            TimeInterval::from_local("2024-04-08", "2024-04-09", Some("")).unwrap();
        assert_eq!(interval.start.offset().local_minus_utc(), 0);
    }

    #[test]
    fn offset_bearing_timestamps_are_converted_not_relabeled() {
        let interval = TimeInterval::from_local(
            "2024-04-08T00:00:00+00:00",
            "2024-04-09T00:00:00+00:00",
            Some("Asia/Tokyo"),
        )
        .unwrap();
        // Midnight UTC is 09:00 in Tokyo, same instant.
        assert_eq!(interval.start.to_rfc3339(), "2024-04-08T09:00:00+09:00");
        assert_eq!(
            interval.start_utc().to_rfc3339(),
            "2024-04-08T00:00:00+00:00"
        );
    }

    #[test]
    fn unknown_timezone_label_is_a_shape_failure() {
        let err = TimeInterval::from_local("2024-04-08", "2024-04-09", Some("Mars/Olympus"))
            .unwrap_err();
        assert!(matches!(err, ShapeError::UnknownTimezone { .. }));
    }

    #[test]
    fn garbage_timestamp_is_a_shape_failure() {
        let err = TimeInterval::from_local("soon", "2024-04-09", None).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidTimestamp { .. }));
    }

    #[test]
    fn interval_ending_before_it_starts_is_a_shape_failure() {
        let err = TimeInterval::from_local("2024-04-10", "2024-04-08", None).unwrap_err();
        assert!(matches!(err, ShapeError::InvertedInterval { .. }));
    }

    #[test]
    fn zero_length_interval_is_allowed() {
        let interval = TimeInterval::from_local("2024-04-08", "2024-04-08", None).unwrap();
        assert_eq!(interval.start, interval.end);
    }

    #[test]
    fn serializes_with_the_local_offset() {
        let interval = TimeInterval::from_local(
            "2024-04-08T09:00:00",
            "2024-04-10T18:00:00",
            Some("Asia/Tokyo"),
        )
        .unwrap();
        let json = serde_json::to_value(interval).unwrap();
        assert_eq!(json["start"], "2024-04-08T09:00:00+09:00");
        assert_eq!(json["end"], "2024-04-10T18:00:00+09:00");
    }
}
