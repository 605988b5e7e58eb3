//! Pure date math for alarm scheduling.
//!
//! Everything here is a function of an alarm definition and an instant;
//! no clocks are sampled and nothing is mutated. The engine uses
//! [`matches_minute`] to decide firing and the notification planner uses
//! [`next_occurrence`]; presentation surfaces build countdowns from
//! [`time_until`] and [`format_countdown`].

use time::{Duration, PrimitiveDateTime};

use crate::alarm::{AlarmDefinition, Recurrence};

/// The next instant at which the alarm should fire, strictly after
/// `now`.
///
/// Returns `None` for dated alarms whose instant has passed (they never
/// fire again). One-shot alarms resolve to today if the time is still
/// ahead, else tomorrow. Repeating alarms resolve to the smallest
/// forward day offset whose weekday is a member; a same-weekday alarm
/// whose time already passed today wraps a full week.
pub fn next_occurrence(
    alarm: &AlarmDefinition,
    now: PrimitiveDateTime,
) -> Option<PrimitiveDateTime> {
    let time = alarm.time.as_time();

    match alarm.recurrence() {
        Recurrence::Dated(date) => {
            let instant = PrimitiveDateTime::new(date, time);
            (instant > now).then_some(instant)
        }
        Recurrence::OneShot => {
            let today = PrimitiveDateTime::new(now.date(), time);
            if today > now {
                Some(today)
            } else {
                now.date()
                    .next_day()
                    .map(|tomorrow| PrimitiveDateTime::new(tomorrow, time))
            }
        }
        Recurrence::Repeating(days) => {
            // Offset 7 covers a single-day set whose time already
            // passed today.
            (0..=7i64).find_map(|offset| {
                let date = now.date().checked_add(Duration::days(offset))?;
                if !days.has(date.weekday().into()) {
                    return None;
                }
                let instant = PrimitiveDateTime::new(date, time);
                (instant > now).then_some(instant)
            })
        }
    }
}

/// Whether the alarm should fire within the minute containing `now`.
///
/// Seconds are ignored; the predicate is true for the entire
/// [HH:MM:00, HH:MM:59] window. Suppressing repeat fires within that
/// window is the trigger evaluator's job, not this predicate's.
pub fn matches_minute(alarm: &AlarmDefinition, now: PrimitiveDateTime) -> bool {
    if !alarm.time.matches(now.time()) {
        return false;
    }

    match alarm.recurrence() {
        Recurrence::Dated(date) => now.date() == date,
        Recurrence::OneShot => true,
        Recurrence::Repeating(days) => days.has(now.date().weekday().into()),
    }
}

/// Time remaining until the alarm next fires.
pub fn time_until(alarm: &AlarmDefinition, now: PrimitiveDateTime) -> Option<Duration> {
    next_occurrence(alarm, now).map(|at| at - now)
}

/// Compact countdown text: `"2d 5h 3m"`, `"5h 3m"`, or `"3m"`.
///
/// Minutes round up, so any positive remainder reads at least `"1m"`.
/// Non-positive durations read `"0m"`.
pub fn format_countdown(until: Duration) -> String {
    let total_minutes = (until.whole_seconds().max(0) + 59) / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use time::Date;
    use time::macros::{date, datetime};

    use super::*;
    use crate::alarm::{AlarmDraft, AlarmId, AlarmTime, DaySet, WeekDay};

    // 2025-03-10 is a Monday; the week runs through Sunday 03-16.

    fn one_shot(hour: u8, minute: u8) -> AlarmDefinition {
        AlarmDefinition::from_draft(
            AlarmId::new(1),
            AlarmDraft::at(AlarmTime::new(hour, minute).unwrap()),
        )
    }

    fn repeating(hour: u8, minute: u8, days: &[WeekDay]) -> AlarmDefinition {
        let mut draft = AlarmDraft::at(AlarmTime::new(hour, minute).unwrap());
        draft.days = days.iter().copied().collect();
        AlarmDefinition::from_draft(AlarmId::new(1), draft)
    }

    fn dated(hour: u8, minute: u8, date: Date) -> AlarmDefinition {
        let mut draft = AlarmDraft::at(AlarmTime::new(hour, minute).unwrap());
        draft.specific_date = Some(date);
        AlarmDefinition::from_draft(AlarmId::new(1), draft)
    }

    #[test]
    fn one_shot_later_today() {
        let alarm = one_shot(7, 0);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 06:15:00));
        assert_eq!(next, Some(datetime!(2025-03-10 07:00:00)));
    }

    #[test]
    fn one_shot_rolls_to_tomorrow_when_time_passed() {
        let alarm = one_shot(7, 0);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 07:30:00));
        assert_eq!(next, Some(datetime!(2025-03-11 07:00:00)));
    }

    #[test]
    fn one_shot_at_exact_instant_is_not_future() {
        // Strictly-after contract: at 07:00:00 sharp the occurrence is
        // tomorrow. Firing "now" is matches_minute's business.
        let alarm = one_shot(7, 0);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 07:00:00));
        assert_eq!(next, Some(datetime!(2025-03-11 07:00:00)));
    }

    #[test]
    fn repeating_same_day_before_time() {
        let alarm = repeating(8, 0, &[WeekDay::Monday]);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 07:00:00));
        assert_eq!(next, Some(datetime!(2025-03-10 08:00:00)));
    }

    #[test]
    fn repeating_wraps_a_full_week_when_time_passed() {
        let alarm = repeating(8, 0, &[WeekDay::Monday]);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 08:01:00));
        assert_eq!(next, Some(datetime!(2025-03-17 08:00:00)));
    }

    #[test]
    fn repeating_picks_earliest_member_day() {
        let alarm = repeating(6, 30, &[WeekDay::Friday, WeekDay::Wednesday]);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 12:00:00));
        assert_eq!(next, Some(datetime!(2025-03-12 06:30:00)));
    }

    #[test]
    fn repeating_crosses_the_weekend() {
        let alarm = repeating(9, 0, &[WeekDay::Friday]);
        // Saturday midday; next Friday is six days out.
        let next = next_occurrence(&alarm, datetime!(2025-03-15 12:00:00));
        assert_eq!(next, Some(datetime!(2025-03-21 09:00:00)));
    }

    #[test]
    fn repeating_same_day_after_time_prefers_other_member_day() {
        let alarm = repeating(8, 0, &[WeekDay::Monday, WeekDay::Thursday]);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 09:00:00));
        assert_eq!(next, Some(datetime!(2025-03-13 08:00:00)));
    }

    #[test]
    fn dated_fires_on_its_date() {
        let alarm = dated(7, 30, date!(2025 - 03 - 14));
        let next = next_occurrence(&alarm, datetime!(2025-03-10 12:00:00));
        assert_eq!(next, Some(datetime!(2025-03-14 07:30:00)));
    }

    #[test]
    fn dated_in_the_past_never_fires() {
        let alarm = dated(7, 30, date!(2025 - 03 - 09));
        assert_eq!(next_occurrence(&alarm, datetime!(2025-03-10 12:00:00)), None);
    }

    #[test]
    fn dated_today_with_time_passed_never_fires() {
        let alarm = dated(7, 30, date!(2025 - 03 - 10));
        assert_eq!(next_occurrence(&alarm, datetime!(2025-03-10 08:00:00)), None);
    }

    #[test]
    fn dated_overrides_weekday_set() {
        let mut alarm = dated(7, 30, date!(2025 - 03 - 14));
        alarm.days = DaySet::from(WeekDay::Monday);
        let next = next_occurrence(&alarm, datetime!(2025-03-10 06:00:00));
        assert_eq!(next, Some(datetime!(2025-03-14 07:30:00)));
    }

    #[test]
    fn recomputing_after_the_returned_instant_moves_forward() {
        let cases = [
            repeating(8, 0, &[WeekDay::Monday]),
            repeating(23, 59, &[WeekDay::Sunday, WeekDay::Monday]),
            one_shot(0, 0),
        ];
        let start = datetime!(2025-03-10 07:59:00);

        for alarm in &cases {
            let first = next_occurrence(alarm, start).unwrap();
            assert!(first > start);
            let second = next_occurrence(alarm, first + Duration::minutes(1)).unwrap();
            assert!(second > first, "{second} should be after {first}");
        }
    }

    #[test_case(datetime!(2025-03-10 07:00:00), true; "on the minute")]
    #[test_case(datetime!(2025-03-10 07:00:59), true; "end of the minute")]
    #[test_case(datetime!(2025-03-10 06:59:59), false; "minute before")]
    #[test_case(datetime!(2025-03-10 07:01:00), false; "minute after")]
    fn one_shot_matches_exactly_one_minute(now: PrimitiveDateTime, expected: bool) {
        assert_eq!(matches_minute(&one_shot(7, 0), now), expected);
    }

    #[test]
    fn one_shot_matches_any_day() {
        let alarm = one_shot(7, 0);
        assert!(matches_minute(&alarm, datetime!(2025-03-10 07:00:30)));
        assert!(matches_minute(&alarm, datetime!(2025-03-15 07:00:30)));
    }

    #[test]
    fn repeating_matches_only_member_days() {
        let alarm = repeating(8, 0, &[WeekDay::Monday]);
        assert!(matches_minute(&alarm, datetime!(2025-03-10 08:00:00)));
        assert!(!matches_minute(&alarm, datetime!(2025-03-11 08:00:00)));
    }

    #[test]
    fn dated_matches_only_its_date() {
        let alarm = dated(7, 30, date!(2025 - 03 - 14));
        assert!(matches_minute(&alarm, datetime!(2025-03-14 07:30:00)));
        assert!(!matches_minute(&alarm, datetime!(2025-03-13 07:30:00)));
        assert!(!matches_minute(&alarm, datetime!(2025-03-15 07:30:00)));
    }

    #[test]
    fn time_until_measures_to_next_occurrence() {
        let alarm = one_shot(7, 0);
        let until = time_until(&alarm, datetime!(2025-03-10 06:00:00)).unwrap();
        assert_eq!(until, Duration::hours(1));
    }

    #[test_case(Duration::days(1) + Duration::hours(2) + Duration::minutes(3), "1d 2h 3m")]
    #[test_case(Duration::hours(2) + Duration::minutes(3), "2h 3m")]
    #[test_case(Duration::minutes(45), "45m")]
    #[test_case(Duration::hours(2), "2h 0m")]
    #[test_case(Duration::seconds(30), "1m"; "sub minute rounds up")]
    #[test_case(Duration::ZERO, "0m")]
    #[test_case(Duration::seconds(-5), "0m"; "negative clamps")]
    fn countdown_formats(until: Duration, expected: &str) {
        assert_eq!(format_countdown(until), expected);
    }
}
