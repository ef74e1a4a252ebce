//! Main application state management

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    clock::{to_utc, Clock, SystemClock},
    error::{StoreError, TimerError},
    store::{Accumulator, OptionsStore, TaskLedger},
    timer::{TimerController, TimerStatus, ToggleOutcome},
};
use super::TimerId;

/// File name of the options document inside the data directory
pub const OPTIONS_FILE: &str = "options.json";
/// File name of the task ledger inside the data directory
pub const LEDGER_FILE: &str = "ledger.json";

/// Main application state shared by all request handlers
pub struct AppState {
    /// Running-timer transitions
    pub controller: TimerController,
    /// Accumulated time per task
    pub ledger: Arc<TaskLedger>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Wire the controller to the given stores and clock; elapsed time goes to `ledger`
    pub fn new(
        options: Arc<OptionsStore>,
        ledger: Arc<TaskLedger>,
        clock: Arc<dyn Clock>,
        port: u16,
        host: String,
    ) -> Self {
        let accumulator: Arc<dyn Accumulator> = ledger.clone();
        Self::with_accumulator(options, ledger, accumulator, clock, port, host)
    }

    /// Like [`AppState::new`], but commit elapsed time through `accumulator`.
    /// `ledger` still backs the task queries.
    pub fn with_accumulator(
        options: Arc<OptionsStore>,
        ledger: Arc<TaskLedger>,
        accumulator: Arc<dyn Accumulator>,
        clock: Arc<dyn Clock>,
        port: u16,
        host: String,
    ) -> Self {
        let controller = TimerController::new(options, accumulator, clock);

        Self {
            controller,
            ledger,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Open file-backed stores under `data_dir` using the system clock
    pub fn open(data_dir: &Path, port: u16, host: String) -> Result<Self, StoreError> {
        let options = OptionsStore::open(data_dir.join(OPTIONS_FILE))?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger = TaskLedger::open(data_dir.join(LEDGER_FILE))?.with_clock(clock.clone());
        info!("Using data directory {}", data_dir.display());

        Ok(Self::new(Arc::new(options), Arc::new(ledger), clock, port, host))
    }

    /// In-memory stores, for tests and throwaway servers
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(OptionsStore::in_memory()),
            Arc::new(TaskLedger::in_memory().with_clock(clock.clone())),
            clock,
            0,
            "127.0.0.1".to_string(),
        )
    }

    /// Create the idle timer record if missing
    pub fn install(&self) -> Result<(), TimerError> {
        self.controller.install()
    }

    /// Remove the timer record and all accumulated task time
    pub fn uninstall(&self) -> Result<(), TimerError> {
        self.controller.uninstall()?;
        self.ledger.clear().map_err(TimerError::StateStoreFailure)
    }

    /// Validate raw request input and toggle the timer
    pub fn toggle(&self, timer_id: &str, user_id: &str) -> Result<ToggleOutcome, TimerError> {
        let timer_id = TimerId::parse(timer_id)?;
        let user_id = user_id
            .trim()
            .parse::<u64>()
            .map_err(|_| TimerError::InvalidUserId(user_id.to_string()))?;

        let outcome = self.controller.toggle(timer_id, user_id)?;
        self.record_action(
            format!("toggle {} by user {}", timer_id, user_id),
            to_utc(outcome.toggled_at),
        );
        Ok(outcome)
    }

    /// Current timer status
    pub fn timer_status(&self) -> Result<TimerStatus, TimerError> {
        self.controller.status()
    }

    fn record_action(&self, action: String, at: DateTime<Utc>) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action);
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(at);
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
