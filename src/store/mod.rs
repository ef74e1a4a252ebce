//! Storage collaborators of the timer core
//!
//! The controller talks to two traits: a [`StateStore`] holding the single
//! persisted [`TimerState`] record, and an [`Accumulator`] that adds elapsed
//! seconds to a task. Both have in-memory and JSON-file-backed implementations.

pub mod ledger;
pub mod options;

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    error::StoreError,
    state::{TimerId, TimerState},
};

pub use ledger::{seconds_to_hours, TaskLedger, TaskTime};
pub use options::{OptionsStore, TIMER_OPTION_KEY};

/// Persisted home of the process-wide timer record
pub trait StateStore: Send + Sync {
    /// Read the current record
    fn read(&self) -> Result<TimerState, StoreError>;

    /// Replace the whole record in one write
    fn write(&self, state: &TimerState) -> Result<(), StoreError>;

    /// Create the record in the idle state unless it already exists
    fn install(&self) -> Result<(), StoreError>;

    /// Remove the record
    fn uninstall(&self) -> Result<(), StoreError>;
}

/// Receives elapsed time for a timer's entity
pub trait Accumulator: Send + Sync {
    /// Add `seconds` to the accumulated duration of `entity`. The sentinel id is a no-op.
    fn add_seconds(&self, entity: TimerId, seconds: u64) -> Result<(), StoreError>;
}

/// Read a JSON document, returning `None` when the file does not exist
pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Write a JSON document through a temporary sibling file and rename it into place
pub(crate) fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Remove a file, treating an already missing file as success
pub(crate) fn remove_file_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
