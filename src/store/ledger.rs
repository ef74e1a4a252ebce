//! Per-task accumulated time, kept in hours

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{read_json_file, remove_file_if_exists, write_json_file, Accumulator};
use crate::{
    clock::{Clock, SystemClock},
    error::StoreError,
    state::TimerId,
};

/// Convert seconds to fractional hours
pub fn seconds_to_hours(seconds: u64) -> f64 {
    seconds as f64 / 3600.0
}

/// Accumulated time for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTime {
    pub task_id: TimerId,
    pub hours: f64,
    pub last_accrued_at: Option<DateTime<Utc>>,
}

impl TaskTime {
    fn new(task_id: TimerId) -> Self {
        Self {
            task_id,
            hours: 0.0,
            last_accrued_at: None,
        }
    }
}

/// Task time ledger; the accumulator the timer commits elapsed time into
pub struct TaskLedger {
    path: Option<PathBuf>,
    tasks: Mutex<BTreeMap<TimerId, TaskTime>>,
    /// Stamps `last_accrued_at`
    clock: Arc<dyn Clock>,
}

impl TaskLedger {
    /// Create a ledger that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tasks: Mutex::new(BTreeMap::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Open (or lazily create) a ledger file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries: Vec<TaskTime> = read_json_file(&path)?.unwrap_or_default();
        let tasks = entries.into_iter().map(|t| (t.task_id, t)).collect();
        Ok(Self {
            path: Some(path),
            tasks: Mutex::new(tasks),
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `clock` for accrual timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Recorded hours for a task; zero if nothing was ever accrued
    pub fn hours(&self, task_id: TimerId) -> Result<f64, StoreError> {
        Ok(self.get(task_id)?.map_or(0.0, |t| t.hours))
    }

    pub fn get(&self, task_id: TimerId) -> Result<Option<TaskTime>, StoreError> {
        Ok(self.lock()?.get(&task_id).cloned())
    }

    /// All tasks with recorded time, ordered by id
    pub fn entries(&self) -> Result<Vec<TaskTime>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Drop every entry and remove the backing file
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut tasks = self.lock()?;
        if let Some(path) = &self.path {
            remove_file_if_exists(path)?;
        }
        tasks.clear();
        info!("Task ledger cleared");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<TimerId, TaskTime>>, StoreError> {
        self.tasks.lock().map_err(|_| StoreError::Poisoned("ledger"))
    }
}

impl Accumulator for TaskLedger {
    fn add_seconds(&self, entity: TimerId, seconds: u64) -> Result<(), StoreError> {
        if entity.is_none() {
            return Ok(());
        }

        let mut tasks = self.lock()?;
        let mut entry = tasks
            .get(&entity)
            .cloned()
            .unwrap_or_else(|| TaskTime::new(entity));
        entry.hours += seconds_to_hours(seconds);
        entry.last_accrued_at = Some(self.clock.now_utc());

        if let Some(path) = &self.path {
            let mut next: Vec<TaskTime> = tasks
                .values()
                .filter(|t| t.task_id != entity)
                .cloned()
                .collect();
            next.push(entry.clone());
            next.sort_by_key(|t| t.task_id);
            write_json_file(path, &next)?;
        }

        debug!("Task {} now at {:.4}h (+{}s)", entity, entry.hours, seconds);
        tasks.insert(entity, entry);
        Ok(())
    }
}
