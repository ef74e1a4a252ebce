//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Form,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    error::TimerError,
    state::{AppState, TimerId},
    store::TaskTime,
    timer::TimerStatus,
};
use super::responses::{
    ErrorResponse, HealthResponse, StatusResponse, TaskTimeResponse, ToggleResponse,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Form body of POST /timer/toggle
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub timer_id: String,
    pub current_user: String,
}

fn api_error(e: TimerError) -> ApiError {
    let status = match &e {
        TimerError::InvalidTimerId(_) | TimerError::InvalidUserId(_) => {
            warn!("Rejected request: {}", e);
            StatusCode::BAD_REQUEST
        }
        TimerError::StateStoreFailure(_) => {
            error!("Timer state unavailable: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TimerError::AccrualFailure { .. } => {
            error!("Timer changed but elapsed time was not recorded: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::from_error(&e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn errors_map_to_status_codes() {
        let (status, Json(body)) = api_error(TimerError::InvalidTimerId("x".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "invalid_timer_id");

        let (status, Json(body)) = api_error(TimerError::AccrualFailure {
            timer_id: TimerId::new(4).unwrap(),
            seconds: 30,
            source: StoreError::Other("disk full".to_string()),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "accrual_failure");
        assert!(body.message.contains("disk full"));
    }
}

/// Handle POST /timer/toggle - Start, stop, or swap the running timer
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ToggleForm>,
) -> Result<Json<ToggleResponse>, ApiError> {
    // File-backed stores block, so keep them off the async workers
    let outcome = tokio::task::spawn_blocking(move || {
        state.toggle(&form.timer_id, &form.current_user)
    })
    .await
    .map_err(|e| {
        error!("Toggle task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("internal_error", e.to_string())),
        )
    })?
    .map_err(api_error)?;

    info!(
        "Toggle endpoint called - running timer is now {}",
        outcome.running_timer_id
    );
    Ok(Json(outcome.into()))
}

/// Handle GET /timer - Return the running timer and its elapsed time
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimerStatus>, ApiError> {
    state.timer_status().map(Json).map_err(api_error)
}

/// Handle GET /tasks - Return recorded time for every task
pub async fn tasks_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TaskTimeResponse>>, ApiError> {
    let timer = state.timer_status().map_err(api_error)?;
    let mut entries = state
        .ledger
        .entries()
        .map_err(|e| api_error(TimerError::StateStoreFailure(e)))?;

    // The running task shows up even before its first accrual
    if let Some(running) = timer.running.then_some(timer.running_timer_id) {
        if !entries.iter().any(|t| t.task_id == running) {
            entries.push(TaskTime {
                task_id: running,
                hours: 0.0,
                last_accrued_at: None,
            });
            entries.sort_by_key(|t| t.task_id);
        }
    }

    Ok(Json(
        entries
            .into_iter()
            .map(|task| TaskTimeResponse::new(task.task_id, Some(task), &timer))
            .collect(),
    ))
}

/// Handle GET /tasks/:task_id - Return recorded and live time for one task
pub async fn task_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskTimeResponse>, ApiError> {
    let task_id = TimerId::parse(&task_id).map_err(api_error)?;
    if task_id.is_none() {
        return Err(api_error(TimerError::InvalidTimerId(task_id.to_string())));
    }

    let timer = state.timer_status().map_err(api_error)?;
    let task = state
        .ledger
        .get(task_id)
        .map_err(|e| api_error(TimerError::StateStoreFailure(e)))?;

    Ok(Json(TaskTimeResponse::new(task_id, task, &timer)))
}

/// Handle GET /status - Return current server status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let timer = state.timer_status().map_err(api_error)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
