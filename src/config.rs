//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "project-timer")]
#[command(about = "Single-timer time tracking service for project tasks")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554", global = true)]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0", global = true)]
    pub host: String,

    /// Directory holding the timer record and task ledger
    #[arg(short, long, default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to do once the stores are open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Install the timer record if needed and serve the HTTP API (default)
    Serve,
    /// Create the idle timer record and exit
    Install,
    /// Remove the timer record and all accumulated task time
    Uninstall,
    /// Print the current timer status as JSON
    Status,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Subcommand to run, defaulting to serving
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
