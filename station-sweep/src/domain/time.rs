//! Schedule time handling.
//!
//! Timetables provide stop times as "HH:MM" strings. This module stores them
//! as minutes since midnight, folding any time before 04:00 onto the next
//! day so that overnight runs stay monotonically ordered as plain integers.

use chrono::NaiveTime;
use std::fmt;

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

/// Wall-clock times strictly before this cutoff are treated as belonging to
/// the next service day.
const FOLD_CUTOFF_MINUTES: u32 = 4 * 60;

const DAY_MINUTES: u32 = 24 * 60;

/// A schedule time, stored as minutes since midnight of the service day.
///
/// Times parsed from "HH:MM" that fall strictly before 04:00 are shifted by
/// 24 hours, so a run calling at 23:58 and then 00:03 carries the values
/// 1438 and 1443 and ordinary integer comparison gives schedule order.
///
/// # Examples
///
/// ```
/// use station_sweep::domain::ServiceMinute;
///
/// let morning = ServiceMinute::parse_hhmm("08:00").unwrap();
/// assert_eq!(morning.minutes(), 480);
/// assert_eq!(morning.to_string(), "08:00");
///
/// // Before the 04:00 cutoff: folded onto the next day.
/// let late = ServiceMinute::parse_hhmm("01:30").unwrap();
/// assert_eq!(late.minutes(), 24 * 60 + 90);
/// assert_eq!(late.to_string(), "01:30");
/// assert!(morning < late);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceMinute(u32);

impl ServiceMinute {
    /// Create a time directly from a minute count.
    ///
    /// The value is taken as-is; callers supplying raw minutes are expected
    /// to have already applied the overnight fold.
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// # Examples
    ///
    /// ```
    /// use station_sweep::domain::ServiceMinute;
    ///
    /// assert!(ServiceMinute::parse_hhmm("00:00").is_ok());
    /// assert!(ServiceMinute::parse_hhmm("23:59").is_ok());
    ///
    /// assert!(ServiceMinute::parse_hhmm("1430").is_err());
    /// assert!(ServiceMinute::parse_hhmm("25:00").is_err());
    /// assert!(ServiceMinute::parse_hhmm("12:60").is_err());
    /// ```
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

        let mut total = hour * 60 + minute;
        if total < FOLD_CUTOFF_MINUTES {
            total += DAY_MINUTES;
        }

        Ok(Self(total))
    }

    /// Returns the stored minute count (post-fold).
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Returns the wall-clock time of day, discarding the service-day fold.
    pub fn wall_clock(&self) -> NaiveTime {
        let of_day = self.0 % DAY_MINUTES;
        // of_day is < 1440 so the hour and minute are always in range.
        NaiveTime::from_hms_opt(of_day / 60, of_day % 60, 0).unwrap_or_default()
    }

    /// Minutes elapsed from `earlier` to `self`, or `None` if `earlier` is
    /// actually later.
    ///
    /// # Examples
    ///
    /// ```
    /// use station_sweep::domain::ServiceMinute;
    ///
    /// let dep = ServiceMinute::parse_hhmm("09:00").unwrap();
    /// let arr = ServiceMinute::parse_hhmm("09:45").unwrap();
    /// assert_eq!(arr.checked_minutes_since(dep), Some(45));
    /// assert_eq!(dep.checked_minutes_since(arr), None);
    /// ```
    pub fn checked_minutes_since(&self, earlier: Self) -> Option<u32> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Debug for ServiceMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceMinute({} = {})", self.0, self)
    }
}

impl fmt::Display for ServiceMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let of_day = self.0 % DAY_MINUTES;
        write!(f, "{:02}:{:02}", of_day / 60, of_day % 60)
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
