//! Named-options document holding the timer record

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::Mutex,
};

use serde_json::Value;
use tracing::info;

use super::{read_json_file, remove_file_if_exists, write_json_file, StateStore};
use crate::{error::StoreError, state::TimerState};

/// Well-known key the timer record is stored under
pub const TIMER_OPTION_KEY: &str = "project_timer_options";

/// A small key/value options document, optionally persisted to a JSON file
#[derive(Debug)]
pub struct OptionsStore {
    path: Option<PathBuf>,
    options: Mutex<BTreeMap<String, Value>>,
}

impl OptionsStore {
    /// Create an options store that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            path: None,
            options: Mutex::new(BTreeMap::new()),
        }
    }

    /// Open (or lazily create) an options document at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let options: BTreeMap<String, Value> = read_json_file(&path)?.unwrap_or_default();
        Ok(Self {
            path: Some(path),
            options: Mutex::new(options),
        })
    }

    /// Get a raw option value
    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let options = self.lock()?;
        Ok(options.get(key).cloned())
    }

    /// Apply `update` to a copy of the document, persist it, then publish it.
    /// The in-memory document is untouched when persisting fails.
    fn update<F>(&self, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Value>),
    {
        let mut options = self.lock()?;
        let mut next = options.clone();
        update(&mut next);

        if let Some(path) = &self.path {
            if next.is_empty() {
                remove_file_if_exists(path)?;
            } else {
                write_json_file(path, &next)?;
            }
        }

        *options = next;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>, StoreError> {
        self.options
            .lock()
            .map_err(|_| StoreError::Poisoned("options"))
    }
}

impl StateStore for OptionsStore {
    fn read(&self) -> Result<TimerState, StoreError> {
        let value = self
            .get(TIMER_OPTION_KEY)?
            .ok_or(StoreError::NotInstalled(TIMER_OPTION_KEY))?;

        serde_json::from_value(value).map_err(|source| StoreError::Json {
            path: self.path.clone().unwrap_or_default(),
            source,
        })
    }

    fn write(&self, state: &TimerState) -> Result<(), StoreError> {
        let value = serde_json::to_value(state).map_err(|source| StoreError::Json {
            path: self.path.clone().unwrap_or_default(),
            source,
        })?;
        self.update(|options| {
            options.insert(TIMER_OPTION_KEY.to_string(), value);
        })
    }

    fn install(&self) -> Result<(), StoreError> {
        if self.get(TIMER_OPTION_KEY)?.is_some() {
            info!("Timer record already installed");
            return Ok(());
        }

        info!("Installing idle timer record under '{}'", TIMER_OPTION_KEY);
        self.write(&TimerState::idle())
    }

    fn uninstall(&self) -> Result<(), StoreError> {
        info!("Removing timer record '{}'", TIMER_OPTION_KEY);
        self.update(|options| {
            options.remove(TIMER_OPTION_KEY);
        })
    }
}
