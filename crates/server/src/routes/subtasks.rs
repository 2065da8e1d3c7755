use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::subtask::{CreateSubtask, Subtask, SubtaskFilter, UpdateSubtask};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_subtask_middleware};

pub async fn get_subtasks(
    State(state): State<AppState>,
    Query(filter): Query<SubtaskFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Subtask>>>, ApiError> {
    let subtasks = Subtask::find_all(&state.db().conn, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(subtasks)))
}

pub async fn get_subtask(
    Extension(subtask): Extension<Subtask>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub async fn create_subtask(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubtask>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Subtask title must not be empty".to_string()));
    }
    let subtask = Subtask::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub async fn update_subtask(
    Extension(existing): Extension<Subtask>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateSubtask>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    if let Some(title) = &payload.title
        && title.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Subtask title must not be empty".to_string()));
    }
    let subtask = Subtask::update(&state.db().conn, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub async fn delete_subtask(
    Extension(subtask): Extension<Subtask>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Subtask::delete(&state.db().conn, subtask.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Subtask not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let subtask_id_router = Router::new()
        .route(
            "/",
            get(get_subtask).put(update_subtask).delete(delete_subtask),
        )
        .layer(from_fn_with_state(state.clone(), load_subtask_middleware));

    let subtasks_router = Router::new()
        .route("/", get(get_subtasks).post(create_subtask))
        .nest("/{id}", subtask_id_router);

    Router::new().nest("/subtasks", subtasks_router)
}
