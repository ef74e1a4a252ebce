//! Project Timer - single-timer time tracking for project tasks
//!
//! At most one timer runs at a time. Toggling a timer starts it, stops it, or
//! swaps it for another, and the time the previous timer ran is committed to
//! that timer's task in the ledger.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{StoreError, TimerError};
pub use state::{AppState, TimerId, TimerState};
pub use timer::{TimerController, TimerStatus, ToggleOutcome};
pub use api::create_router;
