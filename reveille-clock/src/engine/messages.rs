//! Types crossing the engine boundary.

use time::PrimitiveDateTime;
use tokio::sync::oneshot;

use super::active::{ActiveAlarm, DismissOutcome};
use crate::alarm::{AlarmDefinition, AlarmDraft, AlarmId, AlarmTime};
use crate::error::Result;

/// Requests into the engine task. Every command carries a oneshot
/// channel for its reply.
#[derive(Debug)]
pub enum EngineCommand {
    Create {
        draft: AlarmDraft,
        reply: oneshot::Sender<Result<AlarmId>>,
    },
    Update {
        alarm: AlarmDefinition,
        reply: oneshot::Sender<Result<()>>,
    },
    Delete {
        id: AlarmId,
        reply: oneshot::Sender<bool>,
    },
    Toggle {
        id: AlarmId,
        reply: oneshot::Sender<Option<bool>>,
    },
    Snooze {
        reply: oneshot::Sender<Result<PrimitiveDateTime>>,
    },
    Dismiss {
        reply: oneshot::Sender<Result<DismissOutcome>>,
    },
    Answer {
        input: String,
        reply: oneshot::Sender<Result<ChallengeOutcome>>,
    },
}

/// Reply to a challenge answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// Correct; the alarm is dismissed.
    Dismissed,
    /// Wrong; ringing continues.
    Incorrect { attempts_remaining: u8 },
}

/// Navigation prompts pushed to whatever front end is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiIntent {
    /// An alarm started or resumed ringing.
    ShowRinging { id: AlarmId },
    /// Ringing paused or ended; show the list again.
    ReturnToList,
}

/// Point-in-time view of engine state, published over a watch channel
/// after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    /// Presentation order: enabled before disabled, earlier time first.
    pub alarms: Vec<AlarmDefinition>,
    pub active: Option<ActiveAlarmView>,
}

/// The ringing alarm as a front end sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAlarmView {
    pub id: AlarmId,
    pub label: String,
    pub time: AlarmTime,
    pub tone: String,
    pub snooze_count: u32,
    pub is_snoozing: bool,
    pub snooze_until: Option<PrimitiveDateTime>,
    pub challenge: Option<ChallengeView>,
}

/// Pending dismissal challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeView {
    pub question: String,
    pub attempts_remaining: u8,
}

impl From<&ActiveAlarm> for ActiveAlarmView {
    fn from(active: &ActiveAlarm) -> Self {
        let alarm = active.alarm();
        Self {
            id: alarm.id(),
            label: alarm.display_label().to_string(),
            time: alarm.time,
            tone: alarm.tone.clone(),
            snooze_count: active.snooze_count(),
            is_snoozing: active.is_snoozing(),
            snooze_until: active.snooze_until(),
            challenge: active.challenge().map(|gate| ChallengeView {
                question: gate.question().to_string(),
                attempts_remaining: gate.attempts_remaining(),
            }),
        }
    }
}
