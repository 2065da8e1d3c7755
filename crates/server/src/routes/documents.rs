use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    document::{CreateDocument, Document, DocumentFilter, DocumentWithVersions, UpdateDocument},
    document_version::{CreateDocumentVersion, DocumentVersion},
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{UserId, load_document_middleware},
};

pub async fn get_documents(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Document>>>, ApiError> {
    let documents = Document::find_all(&state.db().conn, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(documents)))
}

pub async fn get_document(
    Extension(document): Extension<Document>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<DocumentWithVersions>>, ApiError> {
    let versions = DocumentVersion::find_by_document(&state.db().conn, document.id).await?;
    Ok(ResponseJson(ApiResponse::success(DocumentWithVersions {
        document,
        versions,
    })))
}

pub async fn create_document(
    State(state): State<AppState>,
    Json(payload): Json<CreateDocument>,
) -> Result<ResponseJson<ApiResponse<Document>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Document title must not be empty".to_string()));
    }
    let document = Document::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(document)))
}

pub async fn update_document(
    Extension(existing): Extension<Document>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateDocument>,
) -> Result<ResponseJson<ApiResponse<Document>>, ApiError> {
    if let Some(title) = &payload.title
        && title.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Document title must not be empty".to_string()));
    }
    let document = Document::update(&state.db().conn, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(document)))
}

pub async fn delete_document(
    Extension(document): Extension<Document>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Document::delete(&state.db().conn, document.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_document_versions(
    Extension(document): Extension<Document>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<DocumentVersion>>>, ApiError> {
    let versions = DocumentVersion::find_by_document(&state.db().conn, document.id).await?;
    Ok(ResponseJson(ApiResponse::success(versions)))
}

pub async fn create_document_version(
    Extension(document): Extension<Document>,
    State(state): State<AppState>,
    UserId(author): UserId,
    Json(payload): Json<CreateDocumentVersion>,
) -> Result<ResponseJson<ApiResponse<DocumentVersion>>, ApiError> {
    let version = DocumentVersion::create(
        &state.db().conn,
        document.id,
        &payload,
        author,
        Uuid::new_v4(),
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(version)))
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    text: String,
}

#[derive(Debug, serde::Serialize, ts_rs::TS)]
pub struct ClassifyResponse {
    pub prediction: i64,
}

/// Forwards the text to the configured model-serving endpoint.
pub async fn classify_document(
    State(state): State<AppState>,
    Json(payload): Json<ClassifyRequest>,
) -> Result<ResponseJson<ApiResponse<ClassifyResponse>>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text must not be empty".to_string()));
    }
    let prediction = state.classifier().predict(&payload.text).await?;
    Ok(ResponseJson(ApiResponse::success(ClassifyResponse {
        prediction,
    })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let document_id_router = Router::new()
        .route(
            "/",
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .route(
            "/versions",
            get(get_document_versions).post(create_document_version),
        )
        .layer(from_fn_with_state(state.clone(), load_document_middleware));

    let documents_router = Router::new()
        .route("/", get(get_documents).post(create_document))
        .route("/classify", post(classify_document))
        .nest("/{id}", document_id_router);

    Router::new().nest("/documents", documents_router)
}
