//! REST handlers for `/tasks`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::info;

use kanban_core::{NewTask, Task, TaskId, TaskParams, TaskPatch};

use crate::error::ApiError;
use crate::server::AppState;

/// `GET /tasks`: every task, by status rank then position.
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list_ordered()?))
}

/// `GET /tasks/{id}`
pub async fn show_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.tasks.get(&TaskId::from_raw(id))?))
}

/// `POST /tasks`
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(body) = body?;
    let new = NewTask::from_params(TaskParams::from_json(&body)?)?;
    let task = state.tasks.create(new)?;

    info!(task_id = %task.id, status = %task.status, position = task.position, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PATCH /tasks/{id}` (also bound to `PUT`).
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(body) = body?;
    let patch = TaskPatch::from_params(TaskParams::from_json(&body)?)?;
    let task = state.tasks.update(&TaskId::from_raw(id), patch)?;

    info!(task_id = %task.id, status = %task.status, position = task.position, "task updated");
    Ok(Json(task))
}

/// `DELETE /tasks/{id}`
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let task = state.tasks.delete(&TaskId::from_raw(id))?;

    info!(task_id = %task.id, status = %task.status, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}
