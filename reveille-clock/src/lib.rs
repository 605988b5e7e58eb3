//! Alarm clock engine.
//!
//! The engine owns a persisted collection of alarm definitions, polls a
//! wall clock at minute granularity to decide when an alarm should fire,
//! and drives the ringing/snoozing/dismissal lifecycle of the single
//! active alarm instance. Presentation layers talk to it through an
//! [`engine::EngineHandle`] and observe it through a watch snapshot;
//! they never touch alarm state directly.

pub mod alarm;
pub mod challenge;
pub mod clock;
pub mod engine;
pub mod error;
pub mod notify;
pub mod schedule;
pub mod store;
pub mod tone;
pub mod tracing;

pub use alarm::{AlarmDefinition, AlarmDraft, AlarmId, AlarmTime, DaySet, WeekDay};
pub use engine::{AlarmEngine, EngineConfig, EngineHandle};
pub use error::{Error, Result};
