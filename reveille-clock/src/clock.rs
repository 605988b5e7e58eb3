//! Wall-clock abstraction.
//!
//! The engine never samples the OS clock directly; it reads time through
//! [`WallClock`] so tests and the dry-run simulator can drive time
//! manually instead of sleeping.

use std::sync::{Arc, Mutex};

use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Source of the current local date and time.
///
/// Alarms are defined in local naive time (no timezone), so the clock
/// yields [`PrimitiveDateTime`].
pub trait WallClock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> PrimitiveDateTime;
}

/// Clock backed by the operating system.
///
/// Uses the local offset when it can be determined, UTC otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        PrimitiveDateTime::new(now.date(), now.time())
    }
}

/// Manually driven clock.
///
/// Cloneable; all clones share the same instant, so a test or simulator
/// can hold one clone and advance the clock an engine reads through
/// another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<PrimitiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: PrimitiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: PrimitiveDateTime) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PrimitiveDateTime> {
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> PrimitiveDateTime {
        *self.lock()
    }
}
