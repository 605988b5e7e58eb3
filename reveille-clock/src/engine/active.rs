//! The single ringing alarm.
//!
//! At most one alarm may ring at a time. The instance is built from a
//! snapshot of the definition at fire time and never re-reads the
//! store, so edits or deletion while ringing cannot change what is
//! ringing.
//!
//! ```text
//!   fire                 snooze                deadline
//!  ------> Ringing -----------------> Snoozing --------> Ringing
//!             |                          |
//!             | dismiss (may be gated)   | dismiss
//!             v                          v
//!         (cleared)                  (cleared)
//! ```
//!
//! The snooze deadline lives inside the instance and is compared
//! against the clock on every engine tick; clearing the instance is
//! all it takes to cancel re-entry.

use time::{Duration, PrimitiveDateTime};

use crate::alarm::AlarmDefinition;
use crate::challenge::{self, MathChallenge};
use crate::error::{Error, Result};

/// Immediate response to a dismiss request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissOutcome {
    /// Ringing is over.
    Dismissed,
    /// A math challenge guards this alarm; answer it first.
    ChallengeRequired { question: String },
}

/// Result of one challenge answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeAttempt {
    Solved,
    Incorrect { attempts_remaining: u8 },
}

const MAX_ATTEMPTS: u8 = 3;

/// Dismissal gate requiring a correct answer.
///
/// The question never changes while the gate is armed. Three wrong
/// answers restart the cycle: the counter returns to full, the
/// question stays.
#[derive(Debug, Clone)]
pub struct ChallengeGate {
    challenge: MathChallenge,
    attempts: u8,
}

impl ChallengeGate {
    pub fn new(challenge: MathChallenge) -> Self {
        Self {
            challenge,
            attempts: 0,
        }
    }

    pub fn question(&self) -> &str {
        &self.challenge.question
    }

    pub fn attempts_remaining(&self) -> u8 {
        MAX_ATTEMPTS - self.attempts
    }

    pub fn submit(&mut self, input: &str) -> ChallengeAttempt {
        if self.challenge.accepts(input) {
            return ChallengeAttempt::Solved;
        }
        self.attempts += 1;
        if self.attempts >= MAX_ATTEMPTS {
            self.attempts = 0;
        }
        ChallengeAttempt::Incorrect {
            attempts_remaining: self.attempts_remaining(),
        }
    }

    #[cfg(test)]
    pub fn answer(&self) -> i64 {
        self.challenge.answer
    }
}

/// Snapshot of one ringing alarm plus its snooze and dismissal state.
#[derive(Debug, Clone)]
pub struct ActiveAlarm {
    alarm: AlarmDefinition,
    snooze_count: u32,
    snoozing: bool,
    snooze_until: Option<PrimitiveDateTime>,
    challenge: Option<ChallengeGate>,
}

impl ActiveAlarm {
    pub fn new(alarm: AlarmDefinition) -> Self {
        Self {
            alarm,
            snooze_count: 0,
            snoozing: false,
            snooze_until: None,
            challenge: None,
        }
    }

    pub fn alarm(&self) -> &AlarmDefinition {
        &self.alarm
    }

    pub fn snooze_count(&self) -> u32 {
        self.snooze_count
    }

    pub fn is_snoozing(&self) -> bool {
        self.snoozing
    }

    pub fn snooze_until(&self) -> Option<PrimitiveDateTime> {
        self.snooze_until
    }

    pub fn challenge(&self) -> Option<&ChallengeGate> {
        self.challenge.as_ref()
    }

    /// Pause ringing for the configured duration. Rejected when the
    /// alarm has snooze turned off or is already snoozing.
    ///
    /// A pending challenge is discarded; waking from snooze starts
    /// over with a fresh question.
    pub fn snooze(&mut self, now: PrimitiveDateTime) -> Option<PrimitiveDateTime> {
        if !self.alarm.snooze_enabled || self.snoozing {
            return None;
        }
        let deadline = now + Duration::minutes(i64::from(self.alarm.snooze_duration_mins));
        self.snooze_count += 1;
        self.snoozing = true;
        self.snooze_until = Some(deadline);
        self.challenge = None;
        Some(deadline)
    }

    /// Advance the snooze timer. Returns true when the deadline has
    /// passed and ringing resumed.
    pub fn resume_if_due(&mut self, now: PrimitiveDateTime) -> bool {
        match self.snooze_until {
            Some(deadline) if self.snoozing && now >= deadline => {
                self.snoozing = false;
                self.snooze_until = None;
                true
            }
            _ => false,
        }
    }

    /// Begin dismissal. Without a challenge the caller can clear the
    /// instance immediately; with one, the same question keeps coming
    /// back until it is answered or snoozed away.
    pub fn request_dismiss(&mut self) -> DismissOutcome {
        if !self.alarm.math_challenge_enabled {
            return DismissOutcome::Dismissed;
        }
        let gate = self.challenge.get_or_insert_with(|| {
            ChallengeGate::new(challenge::generate(self.alarm.math_challenge_difficulty))
        });
        DismissOutcome::ChallengeRequired {
            question: gate.question().to_string(),
        }
    }

    /// Check one answer against the pending challenge.
    pub fn answer(&mut self, input: &str) -> Result<ChallengeAttempt> {
        let Some(gate) = self.challenge.as_mut() else {
            return Err(Error::NoPendingChallenge);
        };
        Ok(gate.submit(input))
    }

    #[cfg(test)]
    pub fn gate_answer(&self) -> Option<i64> {
        self.challenge.as_ref().map(|gate| gate.answer())
    }
}
