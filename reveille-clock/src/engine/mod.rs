//! The alarm engine task.
//!
//! One task owns everything: the persisted collection, the trigger
//! evaluator, the at-most-one active alarm, and the outbound
//! notification plan. Front ends talk to it over a command channel and
//! observe it through a watch snapshot plus a stream of navigation
//! intents. The wall clock is sampled on a short interval; trigger
//! matching itself is per-minute.

mod active;
mod evaluator;
mod messages;

pub use active::DismissOutcome;
pub use messages::{
    ActiveAlarmView, ChallengeOutcome, ChallengeView, EngineCommand, EngineSnapshot, UiIntent,
};

use std::sync::Arc;
use std::time::Duration;

use time::PrimitiveDateTime;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::alarm::{AlarmDefinition, AlarmDraft, AlarmId};
use crate::clock::WallClock;
use crate::error::{Error, Result};
use crate::notify::NotificationPlanner;
use crate::store::AlarmStore;
use crate::tracing::prelude::*;

use active::{ActiveAlarm, ChallengeAttempt};
use evaluator::TriggerEvaluator;

const COMMAND_BUFFER: usize = 16;
const INTENT_BUFFER: usize = 16;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the wall clock is sampled. Only affects latency
    /// within the minute; triggers match at minute granularity.
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

pub struct AlarmEngine {
    config: EngineConfig,
    store: AlarmStore,
    planner: NotificationPlanner,
    clock: Arc<dyn WallClock>,
    evaluator: TriggerEvaluator,
    active: Option<ActiveAlarm>,
    command_rx: mpsc::Receiver<EngineCommand>,
    intent_tx: mpsc::Sender<UiIntent>,
    snapshot_tx: watch::Sender<EngineSnapshot>,
}

impl AlarmEngine {
    /// Build an engine, its cloneable handle, and the intent stream a
    /// front end listens on.
    pub fn new(
        store: AlarmStore,
        planner: NotificationPlanner,
        clock: Arc<dyn WallClock>,
        config: EngineConfig,
    ) -> (Self, EngineHandle, mpsc::Receiver<UiIntent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(EngineSnapshot::default());

        let engine = Self {
            config,
            store,
            planner,
            clock,
            evaluator: TriggerEvaluator::new(),
            active: None,
            command_rx,
            intent_tx,
            snapshot_tx,
        };
        let handle = EngineHandle {
            command_tx,
            snapshot_rx,
            clock: Arc::clone(&engine.clock),
        };
        (engine, handle, intent_rx)
    }

    /// Load persisted state and serve until cancelled.
    pub async fn run(mut self, cancellation: CancellationToken) {
        self.store.load().await;
        self.planner.resync(self.store.alarms(), self.clock.now()).await;
        self.publish();

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Alarm engine started");

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    info!("Alarm engine stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            info!("All engine handles dropped, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// One pass of the clock poll.
    ///
    /// A ringing or snoozing alarm owns the engine until resolved; no
    /// new trigger is evaluated underneath it.
    async fn tick(&mut self) {
        let now = self.clock.now();

        if let Some(active) = self.active.as_mut() {
            if active.resume_if_due(now) {
                let id = active.alarm().id();
                info!(id = %id, "Snooze elapsed, ringing again");
                self.send_intent(UiIntent::ShowRinging { id });
                self.publish();
            }
            return;
        }

        if let Some(id) = self.evaluator.select(self.store.alarms(), now) {
            self.fire(id, now).await;
        }
    }

    async fn fire(&mut self, id: AlarmId, now: PrimitiveDateTime) {
        let Some(alarm) = self.store.get(id) else {
            return;
        };
        let alarm = alarm.clone();
        info!(id = %id, label = %alarm.display_label(), time = %alarm.time, "Alarm fired");

        // One-shot alarms are disabled the moment they fire, so a
        // crash while ringing cannot re-fire them on a later run. The
        // flag is not restored if ringing is cut short.
        if alarm.is_one_shot() {
            self.store.set_enabled(id, false).await;
        }

        self.evaluator.consume(now);
        self.active = Some(ActiveAlarm::new(alarm));
        self.send_intent(UiIntent::ShowRinging { id });
        self.planner.resync(self.store.alarms(), now).await;
        self.publish();
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Create { draft, reply } => {
                let result = self.store.create(draft).await;
                if result.is_ok() {
                    self.after_mutation().await;
                }
                let _ = reply.send(result);
            }
            EngineCommand::Update { alarm, reply } => {
                let result = self.store.update(alarm).await;
                if result.is_ok() {
                    self.after_mutation().await;
                }
                let _ = reply.send(result);
            }
            EngineCommand::Delete { id, reply } => {
                let removed = self.store.delete(id).await;
                if removed {
                    // Deleting the ringing alarm silences it; the
                    // snapshot going inactive tells the front end to
                    // leave the ringing surface.
                    if self.active.as_ref().is_some_and(|a| a.alarm().id() == id) {
                        self.active = None;
                    }
                    self.after_mutation().await;
                }
                let _ = reply.send(removed);
            }
            EngineCommand::Toggle { id, reply } => {
                let enabled = self.store.toggle(id).await;
                if enabled.is_some() {
                    self.after_mutation().await;
                }
                let _ = reply.send(enabled);
            }
            EngineCommand::Snooze { reply } => {
                let _ = reply.send(self.snooze().await);
            }
            EngineCommand::Dismiss { reply } => {
                let _ = reply.send(self.dismiss().await);
            }
            EngineCommand::Answer { input, reply } => {
                let _ = reply.send(self.answer(&input).await);
            }
        }
    }

    async fn after_mutation(&mut self) {
        self.planner.resync(self.store.alarms(), self.clock.now()).await;
        self.publish();
    }

    async fn snooze(&mut self) -> Result<PrimitiveDateTime> {
        let now = self.clock.now();
        let Some(active) = self.active.as_mut() else {
            return Err(Error::NoActiveAlarm);
        };
        let Some(deadline) = active.snooze(now) else {
            return Err(Error::SnoozeUnavailable);
        };
        info!(
            id = %active.alarm().id(),
            until = %deadline,
            count = active.snooze_count(),
            "Alarm snoozed"
        );
        self.send_intent(UiIntent::ReturnToList);
        self.publish();
        Ok(deadline)
    }

    async fn dismiss(&mut self) -> Result<DismissOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Err(Error::NoActiveAlarm);
        };
        let outcome = active.request_dismiss();
        match &outcome {
            DismissOutcome::Dismissed => self.finish_dismissal().await,
            DismissOutcome::ChallengeRequired { .. } => {
                // Snapshot now carries the question and counter.
                self.publish();
            }
        }
        Ok(outcome)
    }

    async fn answer(&mut self, input: &str) -> Result<ChallengeOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Err(Error::NoActiveAlarm);
        };
        match active.answer(input)? {
            ChallengeAttempt::Solved => {
                self.finish_dismissal().await;
                Ok(ChallengeOutcome::Dismissed)
            }
            ChallengeAttempt::Incorrect { attempts_remaining } => {
                debug!(attempts_remaining, "Wrong challenge answer");
                self.publish();
                Ok(ChallengeOutcome::Incorrect { attempts_remaining })
            }
        }
    }

    /// Tear down the active instance after a successful dismissal.
    async fn finish_dismissal(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let alarm = active.alarm();
        info!(id = %alarm.id(), snoozes = active.snooze_count(), "Alarm dismissed");

        // One-shot and dated alarms are spent once dismissed. The
        // one-shot flag is usually already off from fire time, so this
        // mostly covers the dated class.
        if alarm.fires_once() {
            self.store.set_enabled(alarm.id(), false).await;
        }

        self.send_intent(UiIntent::ReturnToList);
        self.planner.resync(self.store.alarms(), self.clock.now()).await;
        self.publish();
    }

    fn send_intent(&self, intent: UiIntent) {
        // A slow or absent front end must not stall the engine.
        if self.intent_tx.try_send(intent).is_err() {
            debug!("Dropped UI intent, receiver not keeping up");
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(EngineSnapshot {
            alarms: self.store.sorted(),
            active: self.active.as_ref().map(ActiveAlarmView::from),
        });
    }
}

/// Cloneable front-end handle to a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    snapshot_rx: watch::Receiver<EngineSnapshot>,
    clock: Arc<dyn WallClock>,
}

impl EngineHandle {
    pub async fn create(&self, draft: AlarmDraft) -> Result<AlarmId> {
        self.request(|reply| EngineCommand::Create { draft, reply })
            .await?
    }

    pub async fn update(&self, alarm: AlarmDefinition) -> Result<()> {
        self.request(|reply| EngineCommand::Update { alarm, reply })
            .await?
    }

    /// Returns whether the alarm existed.
    pub async fn delete(&self, id: AlarmId) -> Result<bool> {
        self.request(|reply| EngineCommand::Delete { id, reply })
            .await
    }

    /// Returns the new enabled state, `None` for unknown ids.
    pub async fn toggle(&self, id: AlarmId) -> Result<Option<bool>> {
        self.request(|reply| EngineCommand::Toggle { id, reply })
            .await
    }

    /// Snooze the ringing alarm; returns the wake deadline.
    pub async fn snooze(&self) -> Result<PrimitiveDateTime> {
        self.request(|reply| EngineCommand::Snooze { reply }).await?
    }

    pub async fn dismiss(&self) -> Result<DismissOutcome> {
        self.request(|reply| EngineCommand::Dismiss { reply }).await?
    }

    pub async fn answer(&self, input: impl Into<String>) -> Result<ChallengeOutcome> {
        let input = input.into();
        self.request(|reply| EngineCommand::Answer { input, reply })
            .await?
    }

    /// Clock the engine evaluates triggers against.
    ///
    /// Front ends derive any "now" they display from this so countdowns
    /// agree with trigger decisions under whatever clock was injected.
    pub fn clock(&self) -> &dyn WallClock {
        self.clock.as_ref()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait for the next snapshot publication.
    pub async fn changed(&mut self) -> Result<EngineSnapshot> {
        self.snapshot_rx
            .changed()
            .await
            .map_err(|_| Error::EngineClosed)?;
        Ok(self.snapshot_rx.borrow_and_update().clone())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| Error::EngineClosed)?;
        reply_rx.await.map_err(|_| Error::EngineClosed)
    }
}
