mod days;
mod definition;
mod time_of_day;

pub use days::{DaySet, WeekDay};
pub use definition::{
    AlarmDefinition, AlarmDraft, AlarmId, ChallengeDifficulty, MAX_LABEL_CHARS, Recurrence,
    sort_for_display,
};
pub use time_of_day::AlarmTime;
