use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::{
    models::{
        task::{CreateTask, Task, TaskFilter, TaskWithRelated, TaskWithStats, UpdateTask},
        task_detail::{TaskDetail, UpsertTaskDetail},
    },
    types::TaskStatus,
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_task_middleware};

pub async fn get_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskWithStats>>>, ApiError> {
    let tasks = state.stats().tasks_with_stats(&filter).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<TaskWithRelated>>, ApiError> {
    let task = Task::find_by_id_with_related(&state.db().conn, task.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title must not be empty".to_string()));
    }
    tracing::debug!("Creating task '{}'", payload.title);
    let task = Task::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(existing): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if let Some(title) = &payload.title
        && title.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Task title must not be empty".to_string()));
    }
    let task = Task::update(&state.db().conn, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatus {
    status: TaskStatus,
}

pub async fn update_task_status(
    Extension(existing): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTaskStatus>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::update_status(&state.db().conn, existing.id, payload.status).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn upsert_task_detail(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpsertTaskDetail>,
) -> Result<ResponseJson<ApiResponse<TaskDetail>>, ApiError> {
    let detail = TaskDetail::upsert(&state.db().conn, task.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(detail)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Task::delete(&state.db().conn, task.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct UnassignUserRequest {
    user_id: Uuid,
}

#[derive(Debug, serde::Serialize, ts_rs::TS)]
pub struct UnassignUserResponse {
    pub tasks_unassigned: u64,
}

/// Bulk-clears the assignee from every task held by a user, for the
/// upstream user store to call when a user is removed.
pub async fn unassign_user(
    State(state): State<AppState>,
    Json(payload): Json<UnassignUserRequest>,
) -> Result<ResponseJson<ApiResponse<UnassignUserResponse>>, ApiError> {
    let tasks_unassigned = Task::unassign_user(&state.db().conn, payload.user_id).await?;
    tracing::info!(user_id = %payload.user_id, tasks_unassigned, "Unassigned user from tasks");
    Ok(ResponseJson(ApiResponse::success(UnassignUserResponse {
        tasks_unassigned,
    })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/status", put(update_task_status))
        .route("/detail", put(upsert_task_detail))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let tasks_router = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/unassign", post(unassign_user))
        .nest("/{id}", task_id_router);

    Router::new().nest("/tasks", tasks_router)
}
