use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{DbErr, SqlErr, fetch_plan::FetchPlanError, models::favorite::FavoriteError};
use services::services::ClassifierError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Favorite(#[from] FavoriteError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<FetchPlanError> for ApiError {
    fn from(err: FetchPlanError) -> Self {
        match err {
            FetchPlanError::Database(db_err) => ApiError::Database(db_err),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => StatusCode::NOT_FOUND,
                _ if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Favorite(err) => match err {
                FavoriteError::MissingTarget | FavoriteError::AmbiguousTarget => {
                    StatusCode::BAD_REQUEST
                }
                FavoriteError::Duplicate => StatusCode::CONFLICT,
                FavoriteError::Database(DbErr::RecordNotFound(_)) => StatusCode::NOT_FOUND,
                FavoriteError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Classifier(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("API error: {}", self);
        }

        let response: ApiResponse<()> = ApiResponse::error(&self.to_string());
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_maps_to_404() {
        let err = ApiError::Database(DbErr::RecordNotFound("Topic not found".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_favorite_maps_to_409() {
        let err = ApiError::Favorite(FavoriteError::Duplicate);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn classifier_failures_map_to_503() {
        let err = ApiError::Classifier(ClassifierError::Prediction {
            cause: "empty predictions array".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
