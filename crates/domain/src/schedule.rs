//! Schedule — when an automation is due.
//!
//! A schedule pairs a wall-clock time with an IANA timezone and a set of
//! eligible weekdays. Due checks are minute-resolution and are evaluated in
//! the schedule's own timezone, never the host's.

use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::{ClockTime, Timestamp};

/// A set of ISO weekdays (1 = Monday .. 7 = Sunday).
///
/// Stored representations vary (numbers or numeric strings depending on the
/// writer); deserialization normalizes both into this one canonical type, so
/// membership checks never compare raw storage values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// The empty set. An automation with no days never fires.
    pub const EMPTY: Self = Self(0);

    /// Turn an ISO weekday number into a [`Weekday`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWeekday`] for values outside 1..=7.
    pub fn weekday_from_iso(value: u8) -> Result<Weekday, ValidationError> {
        match value {
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            7 => Ok(Weekday::Sun),
            other => Err(ValidationError::InvalidWeekday(other.to_string())),
        }
    }

    /// Add a weekday to the set.
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    /// Whether the set contains the given weekday.
    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of weekdays in the set.
    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate the set in Monday-to-Sunday order.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        (1..=7u8)
            .filter_map(|iso| Self::weekday_from_iso(iso).ok())
            .filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|day| day.number_from_monday()))
    }
}

/// A stored weekday value before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum WeekdayRepr {
    Number(u8),
    Text(String),
}

impl WeekdayRepr {
    fn normalize(self) -> Result<Weekday, ValidationError> {
        let value = match self {
            Self::Number(value) => value,
            Self::Text(text) => text
                .trim()
                .parse::<u8>()
                .map_err(|_| ValidationError::InvalidWeekday(text.clone()))?,
        };
        WeekdaySet::weekday_from_iso(value)
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<WeekdayRepr>::deserialize(deserializer)?;
        let mut set = Self::EMPTY;
        for repr in raw {
            set.insert(repr.normalize().map_err(serde::de::Error::custom)?);
        }
        Ok(set)
    }
}

/// When an automation fires: a wall-clock time, the timezone in which that
/// wall-clock time is read, and the weekdays on which it is eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Scheduled local time of day (`HH:mm`).
    pub clock: ClockTime,
    /// IANA timezone used to interpret both `clock` and "now".
    pub timezone: Tz,
    /// Weekdays on which the schedule is eligible.
    pub days: WeekdaySet,
}

impl Schedule {
    /// Resolve `clock` on the given calendar date in this schedule's zone.
    ///
    /// Returns `None` when the wall-clock time does not exist on that date
    /// (spring-forward gap). When it occurs twice (fall-back overlap) the
    /// earliest occurrence is used.
    fn resolve_on(&self, date: NaiveDate) -> Option<DateTime<Tz>> {
        match self
            .timezone
            .from_local_datetime(&date.and_time(self.clock.as_naive_time()))
        {
            LocalResult::Single(moment) => Some(moment),
            LocalResult::Ambiguous(earliest, _latest) => Some(earliest),
            LocalResult::None => None,
        }
    }

    /// Whether `now`, truncated to the minute, equals the scheduled time on
    /// the current calendar date in this schedule's timezone.
    #[must_use]
    pub fn matches_minute(&self, now: Timestamp) -> bool {
        let local = now.with_timezone(&self.timezone);
        self.resolve_on(local.date_naive())
            .is_some_and(|scheduled| {
                scheduled.timestamp().div_euclid(60) == now.timestamp().div_euclid(60)
            })
    }

    /// Whether the weekday of `now` in this schedule's timezone is in the
    /// eligible set.
    #[must_use]
    pub fn is_day_eligible(&self, now: Timestamp) -> bool {
        self.days.contains(now.with_timezone(&self.timezone).weekday())
    }

    /// Whether the schedule is due: time matches and the day is eligible.
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.matches_minute(now) && self.is_day_eligible(now)
    }
}
