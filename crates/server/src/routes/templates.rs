use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::template::{CreateTemplate, Template, UpdateTemplate};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_template_middleware};

#[derive(Debug, Deserialize)]
pub struct TemplateListQuery {
    topic_id: Option<Uuid>,
}

pub async fn get_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Template>>>, ApiError> {
    let templates = Template::find_all(&state.db().conn, query.topic_id).await?;
    Ok(ResponseJson(ApiResponse::success(templates)))
}

pub async fn get_template(
    Extension(template): Extension<Template>,
) -> Result<ResponseJson<ApiResponse<Template>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<CreateTemplate>,
) -> Result<ResponseJson<ApiResponse<Template>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Template name must not be empty".to_string()));
    }
    let template = Template::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn update_template(
    Extension(existing): Extension<Template>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTemplate>,
) -> Result<ResponseJson<ApiResponse<Template>>, ApiError> {
    if let Some(name) = &payload.name
        && name.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Template name must not be empty".to_string()));
    }
    let template = Template::update(&state.db().conn, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn delete_template(
    Extension(template): Extension<Template>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Template::delete(&state.db().conn, template.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Template not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let template_id_router = Router::new()
        .route(
            "/",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .layer(from_fn_with_state(state.clone(), load_template_middleware));

    let templates_router = Router::new()
        .route("/", get(get_templates).post(create_template))
        .nest("/{id}", template_id_router);

    Router::new().nest("/templates", templates_router)
}
