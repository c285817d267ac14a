//! Time and timestamp helpers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// UTC timestamp used as the evaluation instant ("now") everywhere.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A wall-clock time of day at minute resolution, parsed from `HH:mm`.
///
/// Seconds do not exist at this granularity; an automation scheduled for
/// `07:00` is due during the whole minute `07:00:00..07:00:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Midnight, `00:00`.
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Build a clock time from hour and minute components.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidClock`] when `hour > 23` or
    /// `minute > 59`.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidClock(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// The hour component (0..=23).
    #[must_use]
    pub fn hour(self) -> u8 {
        self.hour
    }

    /// The minute component (0..=59).
    #[must_use]
    pub fn minute(self) -> u8 {
        self.minute
    }

    /// The same time of day as a [`NaiveTime`] (seconds zeroed).
    #[must_use]
    pub fn as_naive_time(self) -> NaiveTime {
        // Components are range-checked at construction.
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClock(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_parse_two_digit_clock() {
        let clock: ClockTime = "07:30".parse().unwrap();
        assert_eq!(clock.hour(), 7);
        assert_eq!(clock.minute(), 30);
    }

    #[test]
    fn should_parse_single_digit_hour() {
        let clock: ClockTime = "7:05".parse().unwrap();
        assert_eq!(clock.hour(), 7);
        assert_eq!(clock.minute(), 5);
    }

    #[test]
    fn should_reject_out_of_range_components() {
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("12:60".parse::<ClockTime>().is_err());
        assert!(ClockTime::new(24, 0).is_err());
        assert!(ClockTime::new(0, 60).is_err());
    }

    #[test]
    fn should_reject_malformed_strings() {
        for input in ["", "0700", "07:", ":30", "ab:cd", "07:30:00"] {
            assert!(
                input.parse::<ClockTime>().is_err(),
                "expected `{input}` to be rejected"
            );
        }
    }

    #[test]
    fn should_display_zero_padded() {
        let clock = ClockTime::new(7, 5).unwrap();
        assert_eq!(clock.to_string(), "07:05");
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let clock = ClockTime::new(23, 59).unwrap();
        let json = serde_json::to_string(&clock).unwrap();
        assert_eq!(json, "\"23:59\"");
        let parsed: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, clock);
    }

    #[test]
    fn should_convert_to_naive_time() {
        let clock = ClockTime::new(7, 30).unwrap();
        assert_eq!(
            clock.as_naive_time(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
    }
}
