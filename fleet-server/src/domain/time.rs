//! Service time handling.
//!
//! Timetables and trips carry times of day as "HH:MM" strings. This module
//! provides a validated time-of-day type plus the derived assignment window
//! used for conflict detection, handling overnight trips whose end time is
//! numerically before their start time.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A validated time of day with minute precision.
///
/// Parsed from "HH:MM" and stored as minutes from midnight, so comparisons
/// and arithmetic are integer operations.
///
/// # Examples
///
/// ```
/// use fleet_server::domain::DayTime;
///
/// let t = DayTime::parse_hhmm("14:30").unwrap();
/// assert_eq!(t.to_string(), "14:30");
///
/// // Wrapping arithmetic crosses midnight
/// let late = DayTime::parse_hhmm("23:30").unwrap();
/// assert_eq!(late.add_minutes(90).to_string(), "01:00");
///
/// // Invalid strings are rejected
/// assert!(DayTime::parse_hhmm("25:00").is_err());
/// assert!(DayTime::parse_hhmm("1430").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayTime {
    minutes: u16,
}

impl DayTime {
    /// Parse a time from "HH:MM" format.
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self {
            minutes: (hour * 60 + minute) as u16,
        })
    }

    /// Construct from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        Ok(Self {
            minutes: (hour * 60 + minute) as u16,
        })
    }

    /// Construct from minutes since midnight, wrapping modulo 24 hours.
    pub fn from_minutes_wrapping(minutes: i64) -> Self {
        Self {
            minutes: minutes.rem_euclid(MINUTES_PER_DAY as i64) as u16,
        }
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.minutes as u32 / 60
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.minutes as u32 % 60
    }

    /// Minutes since midnight.
    pub fn minutes_from_midnight(&self) -> u32 {
        self.minutes as u32
    }

    /// Add minutes, wrapping past midnight modulo 24 hours.
    pub fn add_minutes(&self, minutes: i64) -> Self {
        Self::from_minutes_wrapping(self.minutes as i64 + minutes)
    }

    /// Convert to a [`NaiveTime`].
    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0)
            .expect("DayTime is always a valid time of day")
    }
}

impl fmt::Debug for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for DayTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hhmm(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// The time interval a trip occupies for conflict detection.
///
/// Derived from a service date and start/end times of day. An end time
/// numerically at or before the start means the trip runs overnight and the
/// end falls on the next day. The interval is half-open: `[start, end)`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use fleet_server::domain::{AssignmentWindow, DayTime};
///
/// let date = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
/// let a = AssignmentWindow::new(
///     date,
///     DayTime::parse_hhmm("08:00").unwrap(),
///     DayTime::parse_hhmm("12:00").unwrap(),
/// );
/// let b = AssignmentWindow::new(
///     date,
///     DayTime::parse_hhmm("12:00").unwrap(),
///     DayTime::parse_hhmm("16:00").unwrap(),
/// );
/// // Touching endpoints do not overlap (half-open intervals)
/// assert!(!a.overlaps(&b));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AssignmentWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl AssignmentWindow {
    /// Derive the window for a trip on `service_date`.
    pub fn new(service_date: NaiveDate, start: DayTime, end: DayTime) -> Self {
        let start_dt = service_date.and_time(start.to_naive());
        let end_date = if end <= start {
            // Overnight trip: the end time belongs to the next day.
            next_day(service_date)
        } else {
            service_date
        };
        Self {
            start: start_dt,
            end: end_date.and_time(end.to_naive()),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Half-open interval overlap: `[s1,e1)` and `[s2,e2)` overlap iff
    /// `s1 < e2 && s2 < e1`.
    pub fn overlaps(&self, other: &AssignmentWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Length of the window in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Minutes of rest between this window and another, zero if they overlap.
    pub fn rest_gap_minutes(&self, other: &AssignmentWindow) -> i64 {
        if self.overlaps(other) {
            0
        } else if self.end <= other.start {
            (other.start - self.end).num_minutes()
        } else {
            (self.start - other.end).num_minutes()
        }
    }
}

/// An inclusive range of service dates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range. Fails when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeError> {
        if end < start {
            return Err(TimeError::new("end date before start date"));
        }
        Ok(Self { start, end })
    }

    /// A single-day range.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, inclusive of both bounds.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterate over every date in the range.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let start = self.start;
        let days = self.days();
        (0..days).map(move |offset| start + chrono::Duration::days(offset))
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

/// Lowercase day-of-week name as used in timetable restrictions.
pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    }
}
