//! Crate-wide error type.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage I/O failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid alarm: {0}")]
    InvalidAlarm(String),

    #[error("No alarm is ringing")]
    NoActiveAlarm,

    #[error("Snooze is not available right now")]
    SnoozeUnavailable,

    #[error("No challenge is pending")]
    NoPendingChallenge,

    #[error("Engine is no longer running")]
    EngineClosed,
}
