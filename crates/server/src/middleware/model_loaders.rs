//! Path-id middleware: resolves the entity named in the path and stores it
//! as a request extension, so handlers take `Extension<Model>` instead of
//! repeating lookup-or-404 logic.

use std::fmt::Display;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use db::models::{
    comment::Comment, document::Document, project::Project, subtask::Subtask, task::Task,
    template::Template, topic::Topic,
};
use uuid::Uuid;

use crate::AppState;

async fn fetch_model_or_status<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, StatusCode>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn load_request_extension<M, E, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<Response, StatusCode>
where
    M: Clone + Send + Sync + 'static,
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    let model = fetch_model_or_status(model_name, model_id, load_future).await?;
    let mut request = request;
    request.extensions_mut().insert(model);
    Ok(next.run(request).await)
}

macro_rules! loader {
    ($fn_name:ident, $model:ident, $label:literal) => {
        pub async fn $fn_name(
            State(state): State<AppState>,
            Path(id): Path<Uuid>,
            request: Request,
            next: Next,
        ) -> Result<Response, StatusCode> {
            load_request_extension(
                request,
                next,
                $label,
                id,
                $model::find_by_id(&state.db().conn, id),
            )
            .await
        }
    };
}

loader!(load_topic_middleware, Topic, "Topic");
loader!(load_project_middleware, Project, "Project");
loader!(load_task_middleware, Task, "Task");
loader!(load_subtask_middleware, Subtask, "Subtask");
loader!(load_comment_middleware, Comment, "Comment");
loader!(load_document_middleware, Document, "Document");
loader!(load_template_middleware, Template, "Template");

/// Authenticated user id, supplied by the auth layer in front of this
/// service as an `X-User-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::BAD_REQUEST, "missing X-User-Id header"))?;
        let id = raw
            .parse::<Uuid>()
            .map_err(|_| (StatusCode::BAD_REQUEST, "invalid X-User-Id header"))?;
        Ok(UserId(id))
    }
}
