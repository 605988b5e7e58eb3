//! Alarm definitions -- the persisted configuration of wake events.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

use super::{AlarmTime, DaySet};
use crate::error::{Error, Result};

/// Maximum alarm label length, in characters.
pub const MAX_LABEL_CHARS: usize = 30;

/// Unique identifier of an alarm definition.
///
/// Assigned by the store at creation and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(u64);

impl AlarmId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Difficulty of the dismissal math challenge.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChallengeDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// How an alarm recurs, derived from `days` and `specific_date`.
///
/// A specific date overrides weekday repetition, so classification
/// checks the date first. This is a derived view; the underlying fields
/// stay as entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Fires once on the given calendar date, then is disabled.
    Dated(Date),

    /// Fires on every member weekday, indefinitely.
    Repeating(DaySet),

    /// Fires at the next occurrence of the time of day, then disables
    /// itself.
    OneShot,
}

impl fmt::Display for Recurrence {
    /// Short human form: the date for dated alarms, space-separated
    /// weekday abbreviations for repeating ones, `once` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Recurrence::Dated(date) => write!(
                f,
                "{:04}-{:02}-{:02}",
                date.year(),
                date.month() as u8,
                date.day()
            ),
            Recurrence::Repeating(days) => {
                let mut first = true;
                for day in days.days() {
                    if !first {
                        f.write_str(" ")?;
                    }
                    f.write_str(day.short())?;
                    first = false;
                }
                Ok(())
            }
            Recurrence::OneShot => f.write_str("once"),
        }
    }
}

/// Configuration of a new alarm, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmDraft {
    pub time: AlarmTime,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub days: DaySet,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_date")]
    pub specific_date: Option<Date>,
    pub tone: String,
    pub snooze_enabled: bool,
    pub snooze_duration_mins: u16,
    pub math_challenge_enabled: bool,
    pub math_challenge_difficulty: ChallengeDifficulty,
}

impl AlarmDraft {
    /// A draft for the given time with the stock settings: enabled,
    /// one-shot, default tone, five-minute snooze, no challenge.
    pub fn at(time: AlarmTime) -> Self {
        Self {
            time,
            enabled: true,
            label: None,
            days: DaySet::empty(),
            specific_date: None,
            tone: "default".to_string(),
            snooze_enabled: true,
            snooze_duration_mins: 5,
            math_challenge_enabled: false,
            math_challenge_difficulty: ChallengeDifficulty::Easy,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_config(self.label.as_deref(), self.snooze_duration_mins)
    }
}

/// A persisted alarm.
///
/// Everything except the id is freely editable; updates go through the
/// store so the collection and its persistence stay consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmDefinition {
    id: AlarmId,
    pub time: AlarmTime,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub days: DaySet,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_date")]
    pub specific_date: Option<Date>,
    pub tone: String,
    pub snooze_enabled: bool,
    pub snooze_duration_mins: u16,
    pub math_challenge_enabled: bool,
    pub math_challenge_difficulty: ChallengeDifficulty,
}

impl AlarmDefinition {
    /// Materialize a draft under its assigned id.
    pub fn from_draft(id: AlarmId, draft: AlarmDraft) -> Self {
        Self {
            id,
            time: draft.time,
            enabled: draft.enabled,
            label: draft.label,
            days: draft.days,
            specific_date: draft.specific_date,
            tone: draft.tone,
            snooze_enabled: draft.snooze_enabled,
            snooze_duration_mins: draft.snooze_duration_mins,
            math_challenge_enabled: draft.math_challenge_enabled,
            math_challenge_difficulty: draft.math_challenge_difficulty,
        }
    }

    pub fn id(&self) -> AlarmId {
        self.id
    }

    pub fn recurrence(&self) -> Recurrence {
        if let Some(date) = self.specific_date {
            Recurrence::Dated(date)
        } else if !self.days.is_empty() {
            Recurrence::Repeating(self.days)
        } else {
            Recurrence::OneShot
        }
    }

    pub fn is_one_shot(&self) -> bool {
        matches!(self.recurrence(), Recurrence::OneShot)
    }

    /// True for classes that fire once and then stay disabled (one-shot
    /// and dated alarms).
    pub fn fires_once(&self) -> bool {
        !matches!(self.recurrence(), Recurrence::Repeating(_))
    }

    /// Label for display; unlabeled alarms read as "Alarm".
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or("Alarm")
    }

    pub fn validate(&self) -> Result<()> {
        validate_config(self.label.as_deref(), self.snooze_duration_mins)
    }
}

fn validate_config(label: Option<&str>, snooze_duration_mins: u16) -> Result<()> {
    if let Some(label) = label {
        let chars = label.chars().count();
        if chars > MAX_LABEL_CHARS {
            return Err(Error::InvalidAlarm(format!(
                "Label is {chars} characters, limit is {MAX_LABEL_CHARS}"
            )));
        }
    }
    if snooze_duration_mins == 0 {
        return Err(Error::InvalidAlarm(
            "Snooze duration must be at least one minute".to_string(),
        ));
    }
    Ok(())
}

/// Order alarms for presentation: enabled before disabled, then by time
/// ascending. Stable, so alarms tied on both keys keep their stored
/// order. The stored collection itself is never reordered; the trigger
/// scan relies on insertion order for its first-match tie-break.
pub fn sort_for_display(alarms: &mut [AlarmDefinition]) {
    alarms.sort_by_key(|alarm| (!alarm.enabled, alarm.time));
}

/// Serde adapter for `Option<Date>` as `"YYYY-MM-DD"`.
mod opt_date {
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::Serializer;
    use time::{Date, Month};

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            // skip_serializing_if covers None; serde still requires the arm.
            None => serializer.serialize_none(),
            Some(date) => serializer.collect_str(&format_args!(
                "{:04}-{:02}-{:02}",
                date.year(),
                date.month() as u8,
                date.day()
            )),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| parse(&s).ok_or_else(|| de::Error::custom(format!("Invalid date {s:?}"))))
            .transpose()
    }

    fn parse(s: &str) -> Option<Date> {
        let mut parts = s.splitn(3, '-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u8 = parts.next()?.parse().ok()?;
        let day: u8 = parts.next()?.parse().ok()?;
        let month = Month::try_from(month).ok()?;
        Date::from_calendar_date(year, month, day).ok()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::alarm::WeekDay;

    fn draft(hour: u8, minute: u8) -> AlarmDraft {
        AlarmDraft::at(AlarmTime::new(hour, minute).unwrap())
    }

    #[test]
    fn one_shot_when_no_days_and_no_date() {
        let def = AlarmDefinition::from_draft(AlarmId::new(1), draft(7, 0));
        assert_eq!(def.recurrence(), Recurrence::OneShot);
        assert!(def.is_one_shot());
        assert!(def.fires_once());
    }

    #[test]
    fn repeating_when_days_set() {
        let mut d = draft(7, 0);
        d.days = DaySet::from(WeekDay::Monday);
        let def = AlarmDefinition::from_draft(AlarmId::new(1), d);
        assert_eq!(def.recurrence(), Recurrence::Repeating(def.days));
        assert!(!def.fires_once());
    }

    #[test]
    fn specific_date_overrides_days() {
        let mut d = draft(7, 0);
        d.days = DaySet::from(WeekDay::Monday);
        d.specific_date = Some(date!(2025 - 12 - 24));
        let def = AlarmDefinition::from_draft(AlarmId::new(1), d);
        assert_eq!(def.recurrence(), Recurrence::Dated(date!(2025 - 12 - 24)));
        assert!(def.fires_once());
        assert!(!def.is_one_shot());
    }

    #[test]
    fn recurrence_display_forms() {
        assert_eq!(Recurrence::OneShot.to_string(), "once");
        assert_eq!(
            Recurrence::Dated(date!(2026 - 01 - 05)).to_string(),
            "2026-01-05"
        );

        let days = [WeekDay::Monday, WeekDay::Wednesday, WeekDay::Friday]
            .into_iter()
            .collect();
        assert_eq!(Recurrence::Repeating(days).to_string(), "mon wed fri");
    }

    #[test]
    fn label_at_limit_is_valid() {
        let mut d = draft(7, 0);
        d.label = Some("x".repeat(MAX_LABEL_CHARS));
        assert!(d.validate().is_ok());
    }

    #[test]
    fn over_long_label_is_rejected() {
        let mut d = draft(7, 0);
        d.label = Some("x".repeat(MAX_LABEL_CHARS + 1));
        assert!(d.validate().is_err());
    }

    #[test]
    fn zero_snooze_duration_is_rejected() {
        let mut d = draft(7, 0);
        d.snooze_duration_mins = 0;
        assert!(d.validate().is_err());
    }

    #[test]
    fn display_label_falls_back() {
        let mut d = draft(7, 0);
        d.label = Some(String::new());
        let def = AlarmDefinition::from_draft(AlarmId::new(1), d);
        assert_eq!(def.display_label(), "Alarm");

        let def = AlarmDefinition::from_draft(AlarmId::new(2), draft(7, 0));
        assert_eq!(def.display_label(), "Alarm");

        let mut d = draft(7, 0);
        d.label = Some("Gym".to_string());
        let def = AlarmDefinition::from_draft(AlarmId::new(3), d);
        assert_eq!(def.display_label(), "Gym");
    }

    #[test]
    fn sort_puts_enabled_first_then_time() {
        let mut early_disabled = draft(6, 0);
        early_disabled.enabled = false;
        let mut alarms = vec![
            AlarmDefinition::from_draft(AlarmId::new(1), early_disabled),
            AlarmDefinition::from_draft(AlarmId::new(2), draft(9, 30)),
            AlarmDefinition::from_draft(AlarmId::new(3), draft(7, 0)),
        ];

        sort_for_display(&mut alarms);

        let ids: Vec<u64> = alarms.iter().map(|a| a.id().value()).collect();
        assert_eq!(ids, [3, 2, 1]);
    }

    #[test]
    fn sort_is_stable_for_equal_times() {
        let mut alarms = vec![
            AlarmDefinition::from_draft(AlarmId::new(1), draft(6, 30)),
            AlarmDefinition::from_draft(AlarmId::new(2), draft(6, 30)),
        ];

        sort_for_display(&mut alarms);

        let ids: Vec<u64> = alarms.iter().map(|a| a.id().value()).collect();
        assert_eq!(ids, [1, 2]);
    }

    #[test]
    fn serde_round_trip() {
        let mut d = draft(6, 45);
        d.label = Some("Run".to_string());
        d.days = [WeekDay::Tuesday, WeekDay::Thursday].into_iter().collect();
        d.math_challenge_enabled = true;
        d.math_challenge_difficulty = ChallengeDifficulty::Hard;
        let def = AlarmDefinition::from_draft(AlarmId::new(42), d);

        let json = serde_json::to_string(&def).unwrap();
        let back: AlarmDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn serde_date_form() {
        let mut d = draft(8, 0);
        d.specific_date = Some(date!(2026 - 01 - 05));
        let def = AlarmDefinition::from_draft(AlarmId::new(7), d);

        let json = serde_json::to_string(&def).unwrap();
        assert!(json.contains(r#""specific_date":"2026-01-05""#), "{json}");

        let back: AlarmDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.specific_date, Some(date!(2026 - 01 - 05)));
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let json = r#"{
            "id": 3,
            "time": "07:30",
            "enabled": true,
            "tone": "default",
            "snooze_enabled": true,
            "snooze_duration_mins": 5,
            "math_challenge_enabled": false,
            "math_challenge_difficulty": "easy"
        }"#;

        let def: AlarmDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.id(), AlarmId::new(3));
        assert!(def.days.is_empty());
        assert_eq!(def.specific_date, None);
        assert_eq!(def.recurrence(), Recurrence::OneShot);
    }
}
