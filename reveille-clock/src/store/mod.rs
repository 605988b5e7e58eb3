//! The alarm collection and its mutation rules.

mod repository;

#[cfg(test)]
pub use repository::FailingRepository;
pub use repository::{AlarmRepository, JsonFileRepository, MemoryRepository};

use crate::alarm::{AlarmDefinition, AlarmDraft, AlarmId, sort_for_display};
use crate::error::Result;
use crate::tracing::prelude::*;

/// Owns the alarm collection; the engine's single mutation point.
///
/// Every mutation validates first, applies in memory, then persists
/// best-effort. A failed write is logged and the in-memory state stays
/// authoritative for the rest of the session; there is no rollback.
///
/// Ids are assigned as max-seen + 1 and never reused within a session,
/// so an id stays unambiguous even after its alarm is deleted.
pub struct AlarmStore {
    alarms: Vec<AlarmDefinition>,
    next_id: u64,
    repository: Box<dyn AlarmRepository>,
}

impl AlarmStore {
    pub fn new(repository: Box<dyn AlarmRepository>) -> Self {
        Self {
            alarms: Vec::new(),
            next_id: 1,
            repository,
        }
    }

    /// Load the persisted collection, replacing in-memory state.
    ///
    /// Fails soft: an unreadable store logs a warning and starts empty.
    pub async fn load(&mut self) {
        match self.repository.load().await {
            Ok(alarms) => {
                self.next_id = alarms.iter().map(|a| a.id().value()).max().unwrap_or(0) + 1;
                info!(count = alarms.len(), "Loaded alarm collection");
                self.alarms = alarms;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load alarms, starting empty");
                self.alarms = Vec::new();
            }
        }
    }

    /// Stored order, which is insertion order. The trigger scan
    /// iterates this so that first-inserted wins on a shared minute.
    pub fn alarms(&self) -> &[AlarmDefinition] {
        &self.alarms
    }

    pub fn get(&self, id: AlarmId) -> Option<&AlarmDefinition> {
        self.alarms.iter().find(|a| a.id() == id)
    }

    /// Presentation order: enabled before disabled, earlier time first.
    pub fn sorted(&self) -> Vec<AlarmDefinition> {
        let mut alarms = self.alarms.clone();
        sort_for_display(&mut alarms);
        alarms
    }

    /// Validate the draft, assign the next id, append and persist.
    pub async fn create(&mut self, draft: AlarmDraft) -> Result<AlarmId> {
        draft.validate()?;
        let id = AlarmId::new(self.next_id);
        self.next_id += 1;
        self.alarms.push(AlarmDefinition::from_draft(id, draft));
        info!(id = %id, "Created alarm");
        self.persist().await;
        Ok(id)
    }

    /// Replace the definition carrying the same id.
    ///
    /// Unknown ids are a logged no-op, not an error: the alarm may have
    /// been deleted since the caller last looked.
    pub async fn update(&mut self, alarm: AlarmDefinition) -> Result<()> {
        alarm.validate()?;
        let Some(slot) = self.alarms.iter_mut().find(|a| a.id() == alarm.id()) else {
            debug!(id = %alarm.id(), "Update for unknown alarm ignored");
            return Ok(());
        };
        *slot = alarm;
        self.persist().await;
        Ok(())
    }

    /// Remove by id. Returns whether anything was removed.
    pub async fn delete(&mut self, id: AlarmId) -> bool {
        let before = self.alarms.len();
        self.alarms.retain(|a| a.id() != id);
        if self.alarms.len() == before {
            debug!(id = %id, "Delete for unknown alarm ignored");
            return false;
        }
        info!(id = %id, "Deleted alarm");
        self.persist().await;
        true
    }

    /// Flip the enabled flag. Returns the new state, `None` for
    /// unknown ids.
    pub async fn toggle(&mut self, id: AlarmId) -> Option<bool> {
        let alarm = self.alarms.iter_mut().find(|a| a.id() == id)?;
        alarm.enabled = !alarm.enabled;
        let enabled = alarm.enabled;
        info!(id = %id, enabled, "Toggled alarm");
        self.persist().await;
        Some(enabled)
    }

    /// Set the enabled flag directly. Used for the trigger-time and
    /// dismissal disables of one-shot and dated alarms; idempotent, and
    /// only writes when the flag actually changes.
    pub async fn set_enabled(&mut self, id: AlarmId, enabled: bool) -> bool {
        let Some(alarm) = self.alarms.iter_mut().find(|a| a.id() == id) else {
            debug!(id = %id, "Enable change for unknown alarm ignored");
            return false;
        };
        if alarm.enabled != enabled {
            alarm.enabled = enabled;
            self.persist().await;
        }
        true
    }

    async fn persist(&self) {
        if let Err(e) = self.repository.save(&self.alarms).await {
            warn!(error = %e, "Failed to persist alarms, keeping in-memory state");
        }
    }
}
