//! Single running timer with start/stop/swap toggling

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    error::TimerError,
    state::{TimerId, TimerState},
    store::{seconds_to_hours, Accumulator, StateStore},
};

/// Result of one toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    /// Timer now running, or the sentinel when stopped
    pub running_timer_id: TimerId,
    /// Timer that was running before the toggle
    pub previous_timer_id: TimerId,
    /// Seconds committed to `previous_timer_id`
    pub committed_seconds: u64,
    pub toggled_at: i64,
}

impl ToggleOutcome {
    pub fn is_running(&self) -> bool {
        !self.running_timer_id.is_none()
    }
}

/// Read-only view of the running timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub running: bool,
    pub running_timer_id: TimerId,
    pub started_at: Option<i64>,
    pub started_by: Option<u64>,
    pub elapsed_seconds: u64,
    pub now: i64,
}

impl TimerStatus {
    fn from_state(state: &TimerState, now: i64) -> Self {
        Self {
            running: state.is_running(),
            running_timer_id: state.current_timer_id,
            started_at: state.started_at(),
            started_by: state.started_by,
            elapsed_seconds: state.elapsed_at(now),
            now,
        }
    }

    /// Recorded hours for `task_id` plus the live elapsed time if it is the running task
    pub fn live_hours(&self, task_id: TimerId, recorded_hours: f64) -> f64 {
        if self.running && self.running_timer_id == task_id {
            recorded_hours + seconds_to_hours(self.elapsed_seconds)
        } else {
            recorded_hours
        }
    }
}

/// Owns the running-timer transitions and commits elapsed time on every change
pub struct TimerController {
    store: Arc<dyn StateStore>,
    accumulator: Arc<dyn Accumulator>,
    clock: Arc<dyn Clock>,
    /// Serializes read, decision, write and accrual of a toggle
    toggle_lock: Mutex<()>,
}

impl TimerController {
    pub fn new(
        store: Arc<dyn StateStore>,
        accumulator: Arc<dyn Accumulator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            accumulator,
            clock,
            toggle_lock: Mutex::new(()),
        }
    }

    /// Create the idle timer record if it is missing
    pub fn install(&self) -> Result<(), TimerError> {
        self.store.install().map_err(TimerError::StateStoreFailure)
    }

    /// Remove the timer record
    pub fn uninstall(&self) -> Result<(), TimerError> {
        let _guard = self.toggle_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.store.uninstall().map_err(TimerError::StateStoreFailure)
    }

    /// Start, stop, or swap the running timer.
    ///
    /// Toggling the running timer stops it. Toggling any other id starts it,
    /// replacing whatever was running. Elapsed time always goes to the timer
    /// that was running before the call. The new state is written before the
    /// accrual, so an [`TimerError::AccrualFailure`] leaves the new state in effect.
    pub fn toggle(&self, requested: TimerId, user_id: u64) -> Result<ToggleOutcome, TimerError> {
        let _guard = self.toggle_lock.lock().unwrap_or_else(|e| e.into_inner());

        let previous = self.store.read().map_err(TimerError::StateStoreFailure)?;
        let now = self.clock.now();

        // The sentinel never starts; requesting it stops whatever runs
        let next = if requested == previous.current_timer_id || requested.is_none() {
            TimerState::idle()
        } else {
            TimerState::running(requested, now, Some(user_id))
        };

        self.store
            .write(&next)
            .map_err(TimerError::StateStoreFailure)?;

        match (previous.running_timer(), next.running_timer()) {
            (None, None) => debug!("User {} toggled {} with no timer running", user_id, requested),
            (None, Some(id)) => info!("User {} started timer {}", user_id, id),
            (Some(old), None) => info!("User {} stopped timer {}", user_id, old),
            (Some(old), Some(id)) => info!("User {} swapped timer {} for {}", user_id, old, id),
        }

        let committed_seconds = match previous.running_timer() {
            Some(previous_id) => {
                let elapsed = self.elapsed_since(&previous, now);
                self.accumulator
                    .add_seconds(previous_id, elapsed)
                    .map_err(|source| TimerError::AccrualFailure {
                        timer_id: previous_id,
                        seconds: elapsed,
                        source,
                    })?;
                debug!("Committed {}s to timer {}", elapsed, previous_id);
                elapsed
            }
            None => 0,
        };

        Ok(ToggleOutcome {
            running_timer_id: next.current_timer_id,
            previous_timer_id: previous.current_timer_id,
            committed_seconds,
            toggled_at: now,
        })
    }

    /// Current running timer and its live elapsed time
    pub fn status(&self) -> Result<TimerStatus, TimerError> {
        let state = self.store.read().map_err(TimerError::StateStoreFailure)?;
        Ok(TimerStatus::from_state(&state, self.clock.now()))
    }

    fn elapsed_since(&self, previous: &TimerState, now: i64) -> u64 {
        let started = previous.timer_started_at;
        if now.checked_sub(started).map_or(true, |elapsed| elapsed < 0) {
            warn!(
                "Timer {} start time {} is unusable at now {}, committing 0s",
                previous.current_timer_id, started, now
            );
        }
        previous.elapsed_at(now)
    }
}
