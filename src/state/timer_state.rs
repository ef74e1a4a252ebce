//! Timer state structure and management

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Identifier of a timer (in practice, a task id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(i64);

impl TimerId {
    /// Reserved value meaning "no timer running"
    pub const NONE: TimerId = TimerId(-1);

    /// Build a timer id, rejecting negatives other than the sentinel
    pub fn new(raw: i64) -> Result<Self, TimerError> {
        if raw < 0 && raw != Self::NONE.0 {
            return Err(TimerError::InvalidTimerId(raw.to_string()));
        }
        Ok(TimerId(raw))
    }

    /// Parse a timer id from request input
    pub fn parse(raw: &str) -> Result<Self, TimerError> {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| TimerError::InvalidTimerId(raw.to_string()))?;
        Self::new(value)
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted record of which timer is running and since when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    #[serde(rename = "current_timer")]
    pub current_timer_id: TimerId,
    /// Seconds since epoch; zero when idle
    #[serde(rename = "timer_started")]
    pub timer_started_at: i64,
    /// User whose toggle started the running timer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_by: Option<u64>,
}

impl TimerState {
    /// Create an idle timer state
    pub fn idle() -> Self {
        Self {
            current_timer_id: TimerId::NONE,
            timer_started_at: 0,
            started_by: None,
        }
    }

    /// Create a running timer state
    pub fn running(timer_id: TimerId, started_at: i64, started_by: Option<u64>) -> Self {
        if timer_id.is_none() {
            return Self::idle();
        }
        Self {
            current_timer_id: timer_id,
            timer_started_at: started_at,
            started_by,
        }
    }

    /// Check if a timer is running
    pub fn is_running(&self) -> bool {
        !self.current_timer_id.is_none()
    }

    /// Id of the running timer, if any
    pub fn running_timer(&self) -> Option<TimerId> {
        self.is_running().then_some(self.current_timer_id)
    }

    /// Start time of the running timer, if any
    pub fn started_at(&self) -> Option<i64> {
        self.is_running().then_some(self.timer_started_at)
    }

    /// Seconds the running timer has been going at `now`, clamped at zero
    pub fn elapsed_at(&self, now: i64) -> u64 {
        match self.started_at() {
            Some(started) => now
                .checked_sub(started)
                .and_then(|elapsed| u64::try_from(elapsed).ok())
                .unwrap_or(0),
            None => 0,
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle()
    }
}
