//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::to_utc,
    error::TimerError,
    state::TimerId,
    store::TaskTime,
    timer::{TimerStatus, ToggleOutcome},
};

/// Response to a timer toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// "running" or "stopped"
    pub status: String,
    pub running_timer_id: TimerId,
    pub previous_timer_id: TimerId,
    pub committed_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<ToggleOutcome> for ToggleResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        Self {
            status: if outcome.is_running() { "running" } else { "stopped" }.to_string(),
            running_timer_id: outcome.running_timer_id,
            previous_timer_id: outcome.previous_timer_id,
            committed_seconds: outcome.committed_seconds,
            timestamp: to_utc(outcome.toggled_at),
        }
    }
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn from_error(error: &TimerError) -> Self {
        Self::new(error.code(), error.to_string())
    }

    pub fn new(code: &str, message: String) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Recorded and live time for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTimeResponse {
    pub task_id: TimerId,
    pub recorded_hours: f64,
    /// Recorded hours plus the running timer's elapsed time, if this task is running
    pub live_hours: f64,
    pub running: bool,
    pub last_accrued_at: Option<DateTime<Utc>>,
}

impl TaskTimeResponse {
    pub fn new(task_id: TimerId, task: Option<TaskTime>, timer: &TimerStatus) -> Self {
        let recorded_hours = task.as_ref().map_or(0.0, |t| t.hours);
        Self {
            task_id,
            recorded_hours,
            live_hours: timer.live_hours(task_id, recorded_hours),
            running: timer.running && timer.running_timer_id == task_id,
            last_accrued_at: task.and_then(|t| t.last_accrued_at),
        }
    }
}

/// Server status with timer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerStatus,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
