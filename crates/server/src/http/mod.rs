use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, routes};

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::topics::router(&state))
        .merge(routes::projects::router(&state))
        .merge(routes::tasks::router(&state))
        .merge(routes::subtasks::router(&state))
        .merge(routes::comments::router(&state))
        .merge(routes::documents::router(&state))
        .merge(routes::templates::router(&state))
        .merge(routes::favorites::router());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use db::DBService;
    use serde_json::{Value, json};
    use services::services::{ResultCache, StaticClassifier};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::AppState;

    async fn setup_state() -> AppState {
        let db = DBService::new_in_memory().await.unwrap();
        AppState::new(
            db,
            ResultCache::new(std::time::Duration::ZERO),
            Arc::new(StaticClassifier::always(2)),
        )
    }

    async fn send_json(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", Uuid::new_v4().to_string());
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = super::router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let state = setup_state().await;
        let (status, body) = send_json(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn topic_crud_round_trip() {
        let state = setup_state().await;

        let (status, body) = send_json(
            &state,
            "POST",
            "/api/topics",
            Some(json!({"name": "Platform", "description": "infra work"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let topic_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send_json(&state, "GET", &format!("/api/topics/{topic_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], json!("Platform"));
        assert_eq!(body["data"]["total_projects"], json!(0));
        assert_eq!(body["data"]["active_projects"], json!(0));

        let (status, _) = send_json(
            &state,
            "PUT",
            &format!("/api/topics/{topic_id}"),
            Some(json!({"name": "Platform Eng"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(&state, "DELETE", &format!("/api/topics/{topic_id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(&state, "GET", &format!("/api/topics/{topic_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_topic_name_is_rejected() {
        let state = setup_state().await;
        let (status, body) = send_json(
            &state,
            "POST",
            "/api/topics",
            Some(json!({"name": "  ", "description": null})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn unknown_topic_returns_404() {
        let state = setup_state().await;
        let (status, _) = send_json(
            &state,
            "GET",
            &format!("/api/topics/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    async fn create_topic_project_task(state: &AppState) -> (String, String, String) {
        let (_, body) = send_json(
            state,
            "POST",
            "/api/topics",
            Some(json!({"name": "T", "description": null})),
        )
        .await;
        let topic_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = send_json(
            state,
            "POST",
            "/api/projects",
            Some(json!({"topic_id": topic_id, "name": "P", "description": null})),
        )
        .await;
        let project_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = send_json(
            state,
            "POST",
            "/api/tasks",
            Some(json!({"project_id": project_id, "title": "K"})),
        )
        .await;
        let task_id = body["data"]["id"].as_str().unwrap().to_string();

        (topic_id, project_id, task_id)
    }

    #[tokio::test]
    async fn active_project_count_follows_task_status() {
        let state = setup_state().await;
        let (topic_id, _project_id, task_id) = create_topic_project_task(&state).await;

        let (status, body) = send_json(&state, "GET", &format!("/api/topics/{topic_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["active_projects"], json!(1));

        let (status, _) = send_json(
            &state,
            "PUT",
            &format!("/api/tasks/{task_id}/status"),
            Some(json!({"status": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send_json(&state, "GET", &format!("/api/topics/{topic_id}"), None).await;
        assert_eq!(body["data"]["active_projects"], json!(0));
        assert_eq!(body["data"]["completed_projects"], json!(1));
    }

    #[tokio::test]
    async fn task_detail_carries_related_entities() {
        let state = setup_state().await;
        let (_, _, task_id) = create_topic_project_task(&state).await;

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/subtasks",
            Some(json!({"task_id": task_id, "title": "S"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/comments",
            Some(json!({"task_id": task_id, "content": "note"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(&state, "GET", &format!("/api/tasks/{task_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["subtasks"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["comments"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["project"]["name"], json!("P"));
        assert_eq!(body["data"]["topic"]["name"], json!("T"));
    }

    #[tokio::test]
    async fn duplicate_favorite_is_a_conflict() {
        let state = setup_state().await;
        let (_, project_id, _) = create_topic_project_task(&state).await;
        let user = Uuid::new_v4().to_string();

        let request = |body: Value| {
            Request::builder()
                .method("POST")
                .uri("/api/favorites")
                .header("x-user-id", &user)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = super::router(state.clone())
            .oneshot(request(json!({"project_id": project_id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = super::router(state.clone())
            .oneshot(request(json!({"project_id": project_id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn favorite_requires_exactly_one_target() {
        let state = setup_state().await;
        let (_, project_id, task_id) = create_topic_project_task(&state).await;

        let (status, _) = send_json(&state, "POST", "/api/favorites", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/favorites",
            Some(json!({"project_id": project_id, "task_id": task_id})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn document_versions_are_sequential() {
        let state = setup_state().await;
        let (_, project_id, _) = create_topic_project_task(&state).await;

        let (_, body) = send_json(
            &state,
            "POST",
            "/api/documents",
            Some(json!({"project_id": project_id, "title": "Design", "content": "v0"})),
        )
        .await;
        let doc_id = body["data"]["id"].as_str().unwrap().to_string();

        for expected in 1..=3 {
            let (status, body) = send_json(
                &state,
                "POST",
                &format!("/api/documents/{doc_id}/versions"),
                Some(json!({"content": format!("draft {expected}")})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["version_number"], json!(expected));
        }

        let (status, body) =
            send_json(&state, "GET", &format!("/api/documents/{doc_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["versions"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"]["versions"][0]["version_number"], json!(3));
    }

    #[tokio::test]
    async fn classify_uses_the_configured_classifier() {
        let state = setup_state().await;

        let (status, body) = send_json(
            &state,
            "POST",
            "/api/documents/classify",
            Some(json!({"text": "quarterly report"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["prediction"], json!(2));

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/documents/classify",
            Some(json!({"text": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unavailable_classifier_returns_503() {
        let db = DBService::new_in_memory().await.unwrap();
        let state = AppState::new(
            db,
            ResultCache::new(std::time::Duration::ZERO),
            Arc::new(StaticClassifier::unavailable()),
        );

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/documents/classify",
            Some(json!({"text": "anything"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn topic_deletion_cascades_to_tasks() {
        let state = setup_state().await;
        let (topic_id, _project_id, task_id) = create_topic_project_task(&state).await;

        let (status, _) = send_json(&state, "DELETE", &format!("/api/topics/{topic_id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(&state, "GET", &format!("/api/tasks/{task_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
