//! Minute-boundary trigger selection.

use time::{Date, PrimitiveDateTime};

use crate::alarm::{AlarmDefinition, AlarmId};
use crate::schedule;

/// Decides which alarm, if any, should start ringing at an instant.
///
/// At most one alarm fires per wall-clock minute. When several match
/// the same minute, the first in stored order wins and the rest are
/// absorbed by the consumed marker.
#[derive(Debug, Default)]
pub struct TriggerEvaluator {
    consumed: Option<(Date, u8, u8)>,
}

impl TriggerEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// First enabled alarm matching the current minute, in stored
    /// order. Returns nothing while the minute is already consumed.
    pub fn select(&self, alarms: &[AlarmDefinition], now: PrimitiveDateTime) -> Option<AlarmId> {
        if self.consumed == Some(minute_key(now)) {
            return None;
        }
        alarms
            .iter()
            .find(|a| a.enabled && schedule::matches_minute(a, now))
            .map(|a| a.id())
    }

    /// Mark the current minute as consumed. Called only when a fire
    /// actually happens; an idle minute stays open, so an alarm
    /// created inside it can still ring.
    pub fn consume(&mut self, now: PrimitiveDateTime) {
        self.consumed = Some(minute_key(now));
    }
}

fn minute_key(now: PrimitiveDateTime) -> (Date, u8, u8) {
    (now.date(), now.time().hour(), now.time().minute())
}
