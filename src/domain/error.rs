use crate::domain::models::GroupId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PomodoroError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("a session already exists for group {0}")]
    SessionAlreadyExists(GroupId),
    #[error("no active session for group {0}")]
    NoActiveSession(GroupId),
    #[error("session is already paused")]
    AlreadyPaused,
    #[error("session is not paused")]
    NotPaused,
    #[error("session state unavailable: {0}")]
    LockPoisoned(String),
    #[error("no async runtime to drive the timer: {0}")]
    RuntimeUnavailable(String),
}
