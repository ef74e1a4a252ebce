//! Error types for the timer core and its storage collaborators

use std::path::PathBuf;

use thiserror::Error;

use crate::state::TimerId;

/// Failures raised by the state store and the task ledger
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("timer record '{0}' is not installed")]
    NotInstalled(&'static str),

    #[error("{0} lock poisoned")]
    Poisoned(&'static str),

    /// Injected by test doubles and external stores that report plain messages
    #[error("{0}")]
    Other(String),
}

/// Failures of a toggle, as reported to the caller
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("invalid timer id: {0}")]
    InvalidTimerId(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("timer state store failure: {0}")]
    StateStoreFailure(#[source] StoreError),

    /// The state change already took effect when this is returned
    #[error("failed to accrue {seconds}s to timer {timer_id}: {source}")]
    AccrualFailure {
        timer_id: TimerId,
        seconds: u64,
        #[source]
        source: StoreError,
    },
}

impl TimerError {
    /// Short machine-readable code used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            TimerError::InvalidTimerId(_) => "invalid_timer_id",
            TimerError::InvalidUserId(_) => "invalid_user_id",
            TimerError::StateStoreFailure(_) => "state_store_failure",
            TimerError::AccrualFailure { .. } => "accrual_failure",
        }
    }
}
