use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::comment::{Comment, CommentFilter, CreateComment, UpdateComment};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{UserId, load_comment_middleware},
};

pub async fn get_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = Comment::find_all(&state.db().conn, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(comments)))
}

pub async fn get_comment(
    Extension(comment): Extension<Comment>,
) -> Result<ResponseJson<ApiResponse<Comment>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(comment)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    UserId(author): UserId,
    Json(payload): Json<CreateComment>,
) -> Result<ResponseJson<ApiResponse<Comment>>, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment content must not be empty".to_string()));
    }
    let comment = Comment::create(&state.db().conn, &payload, author, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(comment)))
}

pub async fn update_comment(
    Extension(existing): Extension<Comment>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateComment>,
) -> Result<ResponseJson<ApiResponse<Comment>>, ApiError> {
    if let Some(content) = &payload.content
        && content.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Comment content must not be empty".to_string()));
    }
    let comment = Comment::update(&state.db().conn, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(comment)))
}

pub async fn delete_comment(
    Extension(comment): Extension<Comment>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Comment::delete(&state.db().conn, comment.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let comment_id_router = Router::new()
        .route(
            "/",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .layer(from_fn_with_state(state.clone(), load_comment_middleware));

    let comments_router = Router::new()
        .route("/", get(get_comments).post(create_comment))
        .nest("/{id}", comment_id_router);

    Router::new().nest("/comments", comments_router)
}
