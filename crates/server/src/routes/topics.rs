use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::topic::{CreateTopic, Topic, TopicWithStats, UpdateTopic};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_topic_middleware};

#[derive(Debug, Deserialize)]
pub struct TopicListQuery {
    #[serde(default)]
    active_only: bool,
}

pub async fn get_topics(
    State(state): State<AppState>,
    Query(query): Query<TopicListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<TopicWithStats>>>, ApiError> {
    let topics = if query.active_only {
        state.stats().active_topics().await?
    } else {
        state.stats().topics_with_stats().await?
    };
    Ok(ResponseJson(ApiResponse::success(topics)))
}

pub async fn get_topic(
    Extension(topic): Extension<Topic>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<TopicWithStats>>, ApiError> {
    let topic = Topic::find_by_id_with_stats(&state.db().conn, topic.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(topic)))
}

pub async fn create_topic(
    State(state): State<AppState>,
    Json(payload): Json<CreateTopic>,
) -> Result<ResponseJson<ApiResponse<Topic>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Topic name must not be empty".to_string()));
    }
    let topic = Topic::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(topic)))
}

pub async fn update_topic(
    Extension(existing): Extension<Topic>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTopic>,
) -> Result<ResponseJson<ApiResponse<Topic>>, ApiError> {
    if let Some(name) = &payload.name
        && name.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Topic name must not be empty".to_string()));
    }
    let topic = Topic::update(&state.db().conn, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(topic)))
}

pub async fn delete_topic(
    Extension(topic): Extension<Topic>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Topic::delete(&state.db().conn, topic.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Topic not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let topic_id_router = Router::new()
        .route("/", get(get_topic).put(update_topic).delete(delete_topic))
        .layer(from_fn_with_state(state.clone(), load_topic_middleware));

    let topics_router = Router::new()
        .route("/", get(get_topics).post(create_topic))
        .nest("/{id}", topic_id_router);

    Router::new().nest("/topics", topics_router)
}
