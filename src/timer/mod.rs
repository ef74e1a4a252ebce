//! Timer core
//!
//! Holds the controller that decides which timer runs and commits elapsed
//! time to the previously running one.

pub mod controller;

// Re-export main types
pub use controller::{TimerController, TimerStatus, ToggleOutcome};
