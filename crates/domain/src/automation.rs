//! Automation — a stored rule mapping a schedule to a device command.
//!
//! When an automation's schedule is due, the dispatcher publishes a retained
//! message on `path` carrying the desired on/off state. Non-repeating
//! automations are removed from the store after they fire once.

use serde::{Deserialize, Serialize};

use crate::error::{TempoError, ValidationError};
use crate::id::AutomationId;
use crate::schedule::Schedule;
use crate::time::Timestamp;

/// Canonical payload for "turn on".
pub const PAYLOAD_ON: &[u8] = b"1";
/// Canonical payload for "turn off".
pub const PAYLOAD_OFF: &[u8] = b"0";

/// A scheduled device command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automation {
    pub id: AutomationId,
    /// Topic of the target device.
    pub path: String,
    /// Desired command state.
    pub turn_on: bool,
    #[serde(flatten)]
    pub schedule: Schedule,
    /// `false` means the automation is deleted after its first fire.
    pub repeat: bool,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::Validation`] when:
    /// - `path` is empty ([`ValidationError::EmptyPath`])
    /// - `schedule.days` is empty ([`ValidationError::NoDays`])
    pub fn validate(&self) -> Result<(), TempoError> {
        if self.path.is_empty() {
            return Err(ValidationError::EmptyPath.into());
        }
        if self.schedule.days.is_empty() {
            return Err(ValidationError::NoDays.into());
        }
        Ok(())
    }

    /// The wire payload for this automation's command.
    #[must_use]
    pub fn command_payload(&self) -> &'static [u8] {
        if self.turn_on { PAYLOAD_ON } else { PAYLOAD_OFF }
    }

    /// Whether this automation is due at `now` (minute match + eligible day).
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.schedule.is_due(now)
    }
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    path: Option<String>,
    turn_on: Option<bool>,
    schedule: Option<Schedule>,
    repeat: Option<bool>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn turn_on(mut self, turn_on: bool) -> Self {
        self.turn_on = Some(turn_on);
        self
    }

    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    #[must_use]
    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = Some(repeat);
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::Validation`] if required fields are missing or
    /// invariants fail. A missing schedule surfaces as
    /// [`ValidationError::NoDays`] since the default schedule has no days.
    pub fn build(self) -> Result<Automation, TempoError> {
        let automation = Automation {
            id: self.id.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            turn_on: self.turn_on.unwrap_or(false),
            schedule: self.schedule.unwrap_or(Schedule {
                clock: crate::time::ClockTime::MIDNIGHT,
                timezone: chrono_tz::Tz::UTC,
                days: crate::schedule::WeekdaySet::EMPTY,
            }),
            repeat: self.repeat.unwrap_or(true),
        };
        automation.validate()?;
        Ok(automation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::WeekdaySet;
    use chrono::Weekday;
    use chrono_tz::Tz;

    fn weekday_schedule() -> Schedule {
        Schedule {
            clock: "07:00".parse().unwrap(),
            timezone: Tz::America__New_York,
            days: [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]
            .into_iter()
            .collect(),
        }
    }

    fn valid_automation() -> Automation {
        Automation::builder()
            .path("home/livingroom/lamp")
            .turn_on(true)
            .schedule(weekday_schedule())
            .repeat(false)
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_automation_when_required_fields_provided() {
        let automation = valid_automation();
        assert_eq!(automation.path, "home/livingroom/lamp");
        assert!(automation.turn_on);
        assert!(!automation.repeat);
    }

    #[test]
    fn should_default_to_repeating_when_not_specified() {
        let automation = Automation::builder()
            .path("home/kitchen/light")
            .schedule(weekday_schedule())
            .build()
            .unwrap();
        assert!(automation.repeat);
    }

    #[test]
    fn should_return_validation_error_when_path_is_empty() {
        let result = Automation::builder().schedule(weekday_schedule()).build();
        assert!(matches!(
            result,
            Err(TempoError::Validation(ValidationError::EmptyPath))
        ));
    }

    #[test]
    fn should_return_validation_error_when_days_are_empty() {
        let mut schedule = weekday_schedule();
        schedule.days = WeekdaySet::EMPTY;
        let result = Automation::builder()
            .path("home/kitchen/light")
            .schedule(schedule)
            .build();
        assert!(matches!(
            result,
            Err(TempoError::Validation(ValidationError::NoDays))
        ));
    }

    #[test]
    fn should_set_custom_id_via_builder() {
        let id = AutomationId::new();
        let automation = Automation::builder()
            .id(id)
            .path("home/kitchen/light")
            .schedule(weekday_schedule())
            .build()
            .unwrap();
        assert_eq!(automation.id, id);
    }

    #[test]
    fn should_map_turn_on_to_ascii_one() {
        let automation = valid_automation();
        assert_eq!(automation.command_payload(), b"1");
    }

    #[test]
    fn should_map_turn_off_to_ascii_zero() {
        let mut automation = valid_automation();
        automation.turn_on = false;
        assert_eq!(automation.command_payload(), b"0");
    }

    #[test]
    fn should_roundtrip_automation_through_serde_json() {
        let automation = valid_automation();
        let json = serde_json::to_string(&automation).unwrap();
        let parsed: Automation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, automation);
    }

    #[test]
    fn should_flatten_schedule_fields_in_json() {
        let automation = valid_automation();
        let json: serde_json::Value = serde_json::to_value(&automation).unwrap();
        assert_eq!(json["clock"], "07:00");
        assert_eq!(json["timezone"], "America/New_York");
        assert_eq!(json["days"], serde_json::json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn should_delegate_is_due_to_schedule() {
        let automation = valid_automation();
        // Wednesday 2024-06-12, 07:00 EDT.
        let now = "2024-06-12T11:00:00Z".parse().unwrap();
        assert!(automation.is_due(now));
        let later = "2024-06-12T11:01:00Z".parse().unwrap();
        assert!(!automation.is_due(later));
    }
}
