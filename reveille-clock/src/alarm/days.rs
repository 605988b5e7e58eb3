//! Weekday tags and the repeat-day set.

use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Day of the week an alarm can repeat on.
///
/// String form is the lowercase English day name, which is also the
/// persisted form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekDay {
    /// All days in Monday-first order.
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
        WeekDay::Sunday,
    ];

    /// Three-letter abbreviation ("mon", "tue", ...).
    pub fn short(&self) -> &'static str {
        match self {
            WeekDay::Monday => "mon",
            WeekDay::Tuesday => "tue",
            WeekDay::Wednesday => "wed",
            WeekDay::Thursday => "thu",
            WeekDay::Friday => "fri",
            WeekDay::Saturday => "sat",
            WeekDay::Sunday => "sun",
        }
    }

    fn bit(self) -> DaySet {
        match self {
            WeekDay::Monday => DaySet::MONDAY,
            WeekDay::Tuesday => DaySet::TUESDAY,
            WeekDay::Wednesday => DaySet::WEDNESDAY,
            WeekDay::Thursday => DaySet::THURSDAY,
            WeekDay::Friday => DaySet::FRIDAY,
            WeekDay::Saturday => DaySet::SATURDAY,
            WeekDay::Sunday => DaySet::SUNDAY,
        }
    }
}

impl From<time::Weekday> for WeekDay {
    fn from(day: time::Weekday) -> Self {
        match day {
            time::Weekday::Monday => WeekDay::Monday,
            time::Weekday::Tuesday => WeekDay::Tuesday,
            time::Weekday::Wednesday => WeekDay::Wednesday,
            time::Weekday::Thursday => WeekDay::Thursday,
            time::Weekday::Friday => WeekDay::Friday,
            time::Weekday::Saturday => WeekDay::Saturday,
            time::Weekday::Sunday => WeekDay::Sunday,
        }
    }
}

impl From<WeekDay> for time::Weekday {
    fn from(day: WeekDay) -> Self {
        match day {
            WeekDay::Monday => time::Weekday::Monday,
            WeekDay::Tuesday => time::Weekday::Tuesday,
            WeekDay::Wednesday => time::Weekday::Wednesday,
            WeekDay::Thursday => time::Weekday::Thursday,
            WeekDay::Friday => time::Weekday::Friday,
            WeekDay::Saturday => time::Weekday::Saturday,
            WeekDay::Sunday => time::Weekday::Sunday,
        }
    }
}

bitflags::bitflags! {
    /// Set of weekdays an alarm repeats on.
    ///
    /// Empty means the alarm is one-shot. Membership order is
    /// irrelevant for matching; the persisted form is a day-name array
    /// in Monday-first order regardless of insertion order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DaySet: u8 {
        const MONDAY = 1 << 0;
        const TUESDAY = 1 << 1;
        const WEDNESDAY = 1 << 2;
        const THURSDAY = 1 << 3;
        const FRIDAY = 1 << 4;
        const SATURDAY = 1 << 5;
        const SUNDAY = 1 << 6;
    }
}

impl DaySet {
    pub fn has(&self, day: WeekDay) -> bool {
        self.contains(day.bit())
    }

    pub fn with(mut self, day: WeekDay) -> Self {
        self.insert(day.bit());
        self
    }

    /// Member days in Monday-first order.
    pub fn days(&self) -> impl Iterator<Item = WeekDay> + '_ {
        WeekDay::ALL.into_iter().filter(|day| self.has(*day))
    }
}

impl FromIterator<WeekDay> for DaySet {
    fn from_iter<I: IntoIterator<Item = WeekDay>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DaySet::empty(), |set, day| set.with(day))
    }
}

impl From<WeekDay> for DaySet {
    fn from(day: WeekDay) -> Self {
        day.bit()
    }
}

impl Serialize for DaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.days())
    }
}

impl<'de> Deserialize<'de> for DaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DaySetVisitor;

        impl<'de> Visitor<'de> for DaySetVisitor {
            type Value = DaySet;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("an array of weekday names")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DaySet, A::Error> {
                let mut set = DaySet::empty();
                while let Some(day) = seq.next_element::<WeekDay>()? {
                    set = set.with(day);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(DaySetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let set = DaySet::empty().with(WeekDay::Monday).with(WeekDay::Friday);
        assert!(set.has(WeekDay::Monday));
        assert!(set.has(WeekDay::Friday));
        assert!(!set.has(WeekDay::Sunday));
    }

    #[test]
    fn days_iterate_monday_first() {
        let set: DaySet = [WeekDay::Sunday, WeekDay::Tuesday, WeekDay::Saturday]
            .into_iter()
            .collect();
        let days: Vec<WeekDay> = set.days().collect();
        assert_eq!(days, [WeekDay::Tuesday, WeekDay::Saturday, WeekDay::Sunday]);
    }

    #[test]
    fn duplicate_days_collapse() {
        let set: DaySet = [WeekDay::Monday, WeekDay::Monday].into_iter().collect();
        assert_eq!(set.days().count(), 1);
    }

    #[test]
    fn serializes_as_day_name_array() {
        let set = DaySet::empty()
            .with(WeekDay::Wednesday)
            .with(WeekDay::Monday);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["monday","wednesday"]"#);
    }

    #[test]
    fn deserializes_in_any_order() {
        let set: DaySet = serde_json::from_str(r#"["friday","monday"]"#).unwrap();
        assert_eq!(
            set,
            DaySet::empty().with(WeekDay::Monday).with(WeekDay::Friday)
        );
    }

    #[test]
    fn rejects_unknown_day_name() {
        let result: Result<DaySet, _> = serde_json::from_str(r#"["funday"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn converts_to_and_from_time_weekday() {
        for day in WeekDay::ALL {
            let via_time: WeekDay = time::Weekday::from(day).into();
            assert_eq!(via_time, day);
        }
    }
}
