//! Outbound notification scheduling.
//!
//! Ringing happens in-process; platform notifications are a parallel
//! best-effort channel so a backgrounded or dead UI still alerts. The
//! planner rebuilds the outbound schedule from the full collection
//! after every mutation, fire, and dismissal. Notifications are never
//! cancelled at shutdown -- outliving the process is their purpose.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::alarm::{AlarmDefinition, AlarmId};
use crate::error::Result;
use crate::schedule;
use crate::tracing::prelude::*;

/// Opaque token identifying one scheduled platform notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Delivery backend for platform notifications.
#[async_trait]
pub trait AlarmNotifier: Send + Sync {
    async fn schedule(
        &self,
        alarm: &AlarmDefinition,
        at: PrimitiveDateTime,
    ) -> Result<NotificationHandle>;

    async fn cancel(&self, handle: &NotificationHandle) -> Result<()>;

    /// Drop every notification on the platform, including ones this
    /// process never scheduled.
    async fn cancel_all(&self) -> Result<()>;
}

/// How many outbound notifications to keep scheduled at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScheduleStrategy {
    /// One notification for the soonest upcoming alarm. Enough when
    /// the engine is alive to resync after each fire.
    #[default]
    SingleNext,
    /// One notification per enabled alarm, so later alarms still alert
    /// if the process dies before resyncing.
    PerAlarm,
}

/// Keeps the platform's scheduled notifications in line with the alarm
/// collection.
pub struct NotificationPlanner {
    notifier: Box<dyn AlarmNotifier>,
    strategy: ScheduleStrategy,
    scheduled: Vec<(AlarmId, NotificationHandle)>,
    cleared_stale: bool,
}

impl NotificationPlanner {
    pub fn new(notifier: Box<dyn AlarmNotifier>, strategy: ScheduleStrategy) -> Self {
        Self {
            notifier,
            strategy,
            scheduled: Vec::new(),
            cleared_stale: false,
        }
    }

    /// Rebuild the outbound schedule from the current collection.
    ///
    /// The first pass clears the platform wholesale, since handles
    /// left by a previous process run aren't tracked here. Later
    /// passes replace only our own handles. All failures are logged
    /// and swallowed; ringing never depends on this channel.
    pub async fn resync(&mut self, alarms: &[AlarmDefinition], now: PrimitiveDateTime) {
        if self.cleared_stale {
            for (_, handle) in self.scheduled.drain(..) {
                if let Err(e) = self.notifier.cancel(&handle).await {
                    warn!(handle = %handle.as_str(), error = %e, "Failed to cancel notification");
                }
            }
        } else {
            if let Err(e) = self.notifier.cancel_all().await {
                warn!(error = %e, "Failed to clear stale notifications");
            }
            self.scheduled.clear();
            self.cleared_stale = true;
        }

        let upcoming: Vec<(&AlarmDefinition, PrimitiveDateTime)> = alarms
            .iter()
            .filter(|a| a.enabled)
            .filter_map(|a| schedule::next_occurrence(a, now).map(|at| (a, at)))
            .collect();

        match self.strategy {
            ScheduleStrategy::SingleNext => {
                // min keeps the first of equals, so the earlier-listed
                // alarm wins a shared instant.
                if let Some(&(alarm, at)) = upcoming.iter().min_by_key(|(_, at)| *at) {
                    self.schedule_one(alarm, at).await;
                }
            }
            ScheduleStrategy::PerAlarm => {
                for (alarm, at) in upcoming {
                    self.schedule_one(alarm, at).await;
                }
            }
        }
    }

    async fn schedule_one(&mut self, alarm: &AlarmDefinition, at: PrimitiveDateTime) {
        match self.notifier.schedule(alarm, at).await {
            Ok(handle) => {
                debug!(id = %alarm.id(), at = %at, "Scheduled notification");
                self.scheduled.push((alarm.id(), handle));
            }
            Err(e) => {
                warn!(id = %alarm.id(), error = %e, "Failed to schedule notification");
            }
        }
    }

    /// Ids with a notification currently scheduled, in schedule order.
    pub fn scheduled_ids(&self) -> Vec<AlarmId> {
        self.scheduled.iter().map(|(id, _)| *id).collect()
    }
}

/// Backend that only logs, for headless runs without a platform
/// notification service.
#[derive(Debug, Default)]
pub struct LogNotifier {
    counter: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlarmNotifier for LogNotifier {
    async fn schedule(
        &self,
        alarm: &AlarmDefinition,
        at: PrimitiveDateTime,
    ) -> Result<NotificationHandle> {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        info!(id = %alarm.id(), label = %alarm.display_label(), at = %at, "Would deliver notification");
        Ok(NotificationHandle::new(format!("log-{seq}")))
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<()> {
        debug!(handle = %handle.as_str(), "Cancelled notification");
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        debug!("Cancelled all notifications");
        Ok(())
    }
}

/// Backend that records calls, for asserting on planner and engine
/// behavior.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    inner: std::sync::Arc<std::sync::Mutex<RecordingInner>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct RecordingInner {
    live: Vec<(String, AlarmId, PrimitiveDateTime)>,
    cancelled: Vec<String>,
    cancel_all_calls: usize,
    fail_schedule: bool,
    next_seq: u64,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications scheduled and not yet cancelled.
    pub fn live(&self) -> Vec<(AlarmId, PrimitiveDateTime)> {
        self.lock().live.iter().map(|(_, id, at)| (*id, *at)).collect()
    }

    pub fn cancelled_count(&self) -> usize {
        self.lock().cancelled.len()
    }

    pub fn cancel_all_calls(&self) -> usize {
        self.lock().cancel_all_calls
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        self.lock().fail_schedule = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[async_trait]
impl AlarmNotifier for RecordingNotifier {
    async fn schedule(
        &self,
        alarm: &AlarmDefinition,
        at: PrimitiveDateTime,
    ) -> Result<NotificationHandle> {
        let mut inner = self.lock();
        if inner.fail_schedule {
            return Err(std::io::Error::other("injected schedule failure").into());
        }
        let raw = format!("n-{}", inner.next_seq);
        inner.next_seq += 1;
        inner.live.push((raw.clone(), alarm.id(), at));
        Ok(NotificationHandle::new(raw))
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<()> {
        let mut inner = self.lock();
        inner.live.retain(|(raw, _, _)| raw != handle.as_str());
        inner.cancelled.push(handle.as_str().to_string());
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.live.clear();
        inner.cancel_all_calls += 1;
        Ok(())
    }
}
