use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::{
    project::{CreateProject, Project, ProjectWithStats, UpdateProject},
    project_settings::{ProjectSettings, UpsertProjectSettings},
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_project_middleware};

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    topic_id: Option<Uuid>,
}

pub async fn get_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ProjectWithStats>>>, ApiError> {
    let projects = state.stats().projects_with_stats(query.topic_id).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ProjectWithStats>>, ApiError> {
    let project = Project::find_by_id_with_stats(&state.db().conn, project.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name must not be empty".to_string()));
    }
    tracing::debug!("Creating project '{}'", payload.name);
    let project = Project::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn update_project(
    Extension(existing): Extension<Project>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if let Some(name) = &payload.name
        && name.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Project name must not be empty".to_string()));
    }
    let project = Project::update(&state.db().conn, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Project::delete(&state.db().conn, project.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn upsert_project_settings(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    Json(payload): Json<UpsertProjectSettings>,
) -> Result<ResponseJson<ApiResponse<ProjectSettings>>, ApiError> {
    let settings = ProjectSettings::upsert(&state.db().conn, project.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(settings)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let project_id_router = Router::new()
        .route(
            "/",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/settings", put(upsert_project_settings))
        .layer(from_fn_with_state(state.clone(), load_project_middleware));

    let projects_router = Router::new()
        .route("/", get(get_projects).post(create_project))
        .nest("/{id}", project_id_router);

    Router::new().nest("/projects", projects_router)
}
