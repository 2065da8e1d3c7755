use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::favorite::{CreateFavorite, Favorite};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::UserId};

pub async fn get_favorites(
    State(state): State<AppState>,
    UserId(user): UserId,
) -> Result<ResponseJson<ApiResponse<Vec<Favorite>>>, ApiError> {
    let favorites = Favorite::find_by_user(&state.db().conn, user).await?;
    Ok(ResponseJson(ApiResponse::success(favorites)))
}

pub async fn create_favorite(
    State(state): State<AppState>,
    UserId(user): UserId,
    Json(payload): Json<CreateFavorite>,
) -> Result<ResponseJson<ApiResponse<Favorite>>, ApiError> {
    let favorite = Favorite::create(&state.db().conn, user, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(favorite)))
}

pub async fn delete_favorite(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Favorite::delete(&state.db().conn, user, id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Favorite not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    let favorites_router = Router::new()
        .route("/", get(get_favorites).post(create_favorite))
        .route("/{id}", delete(delete_favorite));

    Router::new().nest("/favorites", favorites_router)
}
