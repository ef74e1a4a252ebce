//! Project Timer - single-timer time tracking for project tasks
//!
//! This is the main entry point for the project-timer application.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use project_timer::{
    api::create_router,
    config::{Command, Config},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("project_timer={},tower_http=info", config.log_level()))
        .init();

    let state = AppState::open(&config.data_dir, config.port, config.host.clone())
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;

    match config.command() {
        Command::Install => {
            state.install()?;
            info!("Timer record installed");
        }
        Command::Uninstall => {
            state.uninstall()?;
            info!("Timer record and task ledger removed");
        }
        Command::Status => {
            let status = state.timer_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Serve => serve(&config, state).await?,
    }

    Ok(())
}

async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    info!("Starting project-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, data_dir={}",
          config.host, config.port, config.data_dir.display());

    state.install()?;
    let status = state.timer_status()?;
    if status.running {
        info!("Timer {} has been running for {}s", status.running_timer_id, status.elapsed_seconds);
    }

    let app = create_router(Arc::new(state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/toggle  - Start, stop, or swap the running timer");
    info!("  GET  /timer         - Running timer and elapsed time");
    info!("  GET  /tasks         - Recorded time for all tasks");
    info!("  GET  /tasks/:id     - Recorded and live time for one task");
    info!("  GET  /status        - Server status");
    info!("  GET  /health        - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
