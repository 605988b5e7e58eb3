//! Minute-precision time of day.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use time::Time;

use crate::error::Error;

/// The wall-clock time an alarm fires at.
///
/// Displays and persists as zero-padded `"HH:MM"`, so lexicographic
/// order on the serialized form equals chronological order. Seconds are
/// always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmTime(Time);

impl AlarmTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, Error> {
        match Time::from_hms(hour, minute, 0) {
            Ok(time) => Ok(Self(time)),
            Err(_) => Err(Error::InvalidAlarm(format!(
                "Time {hour:02}:{minute:02} is out of range"
            ))),
        }
    }

    pub fn hour(&self) -> u8 {
        self.0.hour()
    }

    pub fn minute(&self) -> u8 {
        self.0.minute()
    }

    pub fn as_time(&self) -> Time {
        self.0
    }

    /// True when `instant`'s hour and minute equal this time.
    ///
    /// Seconds are deliberately ignored; matching is minute-granular.
    pub fn matches(&self, instant: Time) -> bool {
        instant.hour() == self.hour() && instant.minute() == self.minute()
    }

    /// 12-hour display form, e.g. `"7:05 AM"`.
    pub fn twelve_hour(&self) -> String {
        let (hour, meridiem) = match self.hour() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute(), meridiem)
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for AlarmTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidAlarm(format!("Invalid time string {s:?}, expected HH:MM"));
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl Serialize for AlarmTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AlarmTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn displays_zero_padded() {
        let t = AlarmTime::new(7, 5).unwrap();
        assert_eq!(t.to_string(), "07:05");
    }

    #[test_case("07:05", 7, 5; "zero padded")]
    #[test_case("7:5", 7, 5; "unpadded accepted")]
    #[test_case("00:00", 0, 0; "midnight")]
    #[test_case("23:59", 23, 59; "end of day")]
    fn parses(s: &str, hour: u8, minute: u8) {
        let t: AlarmTime = s.parse().unwrap();
        assert_eq!((t.hour(), t.minute()), (hour, minute));
    }

    #[test_case("24:00"; "hour out of range")]
    #[test_case("12:60"; "minute out of range")]
    #[test_case("0700"; "missing colon")]
    #[test_case("07:00:00"; "seconds not allowed")]
    #[test_case(""; "empty")]
    fn rejects(s: &str) {
        assert!(s.parse::<AlarmTime>().is_err());
    }

    #[test]
    fn order_matches_string_order() {
        let nine = AlarmTime::new(9, 30).unwrap();
        let ten = AlarmTime::new(10, 0).unwrap();
        assert!(nine < ten);
        assert!(nine.to_string() < ten.to_string());
    }

    #[test]
    fn matching_ignores_seconds() {
        let t = AlarmTime::new(7, 0).unwrap();
        assert!(t.matches(Time::from_hms(7, 0, 0).unwrap()));
        assert!(t.matches(Time::from_hms(7, 0, 59).unwrap()));
        assert!(!t.matches(Time::from_hms(7, 1, 0).unwrap()));
    }

    #[test_case(0, 15, "12:15 AM")]
    #[test_case(7, 5, "7:05 AM")]
    #[test_case(12, 0, "12:00 PM")]
    #[test_case(23, 59, "11:59 PM")]
    fn twelve_hour_form(hour: u8, minute: u8, expected: &str) {
        assert_eq!(AlarmTime::new(hour, minute).unwrap().twelve_hour(), expected);
    }

    #[test]
    fn serde_round_trip() {
        let t = AlarmTime::new(6, 45).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#""06:45""#);
        let back: AlarmTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
