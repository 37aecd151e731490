pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::tagline::handlers as tagline;
use crate::wizard::handlers as wizard;
use crate::wizard::photo::MAX_PHOTO_BYTES;

/// Multipart framing on top of the largest accepted photo, so oversize files
/// reach the upload gate and get its message.
const PHOTO_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Tagline contract
        .route("/api/generate-tagline", post(tagline::handle_generate_tagline))
        .route("/api/questions", get(tagline::handle_list_questions))
        .route("/api/gradients", get(wizard::handle_list_gradients))
        // Wizard sessions
        .route("/api/sessions", post(wizard::handle_create_session))
        .route(
            "/api/sessions/:id",
            get(wizard::handle_get_session).delete(wizard::handle_delete_session),
        )
        .route(
            "/api/sessions/:id/answers/:question",
            put(wizard::handle_set_answer),
        )
        .route(
            "/api/sessions/:id/questions/next",
            post(wizard::handle_next_question),
        )
        .route(
            "/api/sessions/:id/questions/previous",
            post(wizard::handle_previous_question),
        )
        .route("/api/sessions/:id/name", put(wizard::handle_set_name))
        .route(
            "/api/sessions/:id/photo",
            post(wizard::handle_upload_photo).layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT)),
        )
        .route(
            "/api/sessions/:id/photo/position",
            put(wizard::handle_set_position),
        )
        .route("/api/sessions/:id/gradient", put(wizard::handle_select_gradient))
        .route("/api/sessions/:id/next", post(wizard::handle_advance))
        .route("/api/sessions/:id/back", post(wizard::handle_back))
        .route("/api/sessions/:id/reset", post(wizard::handle_reset))
        .route("/api/sessions/:id/regenerate", post(wizard::handle_regenerate))
        .route("/api/sessions/:id/card.png", get(wizard::handle_download_card))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::tagline::catalog::taglines;
    use crate::tagline::classifier::Category;
    use crate::tagline::questions::*;

    fn app() -> Router {
        build_router(AppState::for_tests(Config::for_tests(), StdRng::seed_from_u64(1)))
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Aesthetic Card Maker API is running");
    }

    #[tokio::test]
    async fn test_generate_tagline_success() {
        let (status, body) = post_json(
            "/api/generate-tagline",
            json!({
                "name": "Alex",
                "answers": {
                    "q1": Q1_CALM,
                    "q2": Q2_READ,
                    "q3": Q3_SIMPLE,
                    "q4": Q4_ALONE,
                    "q5": Q5_GRATEFUL
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let tagline = body["tagline"].as_str().unwrap();
        assert!(taglines(Category::CalmIntrospective).contains(&tagline));
    }

    #[tokio::test]
    async fn test_generate_tagline_name_checked_first() {
        let (status, body) = post_json("/api/generate-tagline", json!({ "name": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Name is required" }));
    }

    #[tokio::test]
    async fn test_generate_tagline_missing_answers_object() {
        let (status, body) = post_json("/api/generate-tagline", json!({ "name": "Alex" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Answers are required" }));
    }

    #[tokio::test]
    async fn test_generate_tagline_reports_missing_keys() {
        let (status, body) = post_json(
            "/api/generate-tagline",
            json!({
                "name": "Alex",
                "answers": { "q1": Q1_CALM, "q3": "", "q4": Q4_ALONE, "q5": Q5_GRATEFUL }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "All questions must be answered");
        assert_eq!(body["missing"], json!(["q2", "q3"]));
    }

    async fn post_raw(uri: &str, content_type: Option<&str>, body: &'static str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let response = app().oneshot(builder.body(Body::from(body)).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_generate_tagline_empty_body_is_missing_name() {
        let (status, body) = post_raw("/api/generate-tagline", None, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Name is required" }));

        let (status, body) =
            post_raw("/api/generate-tagline", Some("application/json"), "  ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Name is required" }));
    }

    #[tokio::test]
    async fn test_generate_tagline_malformed_json_is_json_error() {
        let (status, body) =
            post_raw("/api/generate-tagline", Some("application/json"), "{\"name\":").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Request body must be a JSON object"));
    }

    #[tokio::test]
    async fn test_session_body_rejection_is_json_error() {
        let app = app();
        let created = app
            .clone()
            .oneshot(Request::post("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(created.into_body(), usize::MAX).await.unwrap();
        let id = serde_json::from_slice::<Value>(&bytes).unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/sessions/{id}/name"))
            .body(Body::from("{\"name\":\"Alex\"}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_list_questions() {
        let response = app()
            .oneshot(Request::get("/api/questions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let questions = body.as_array().unwrap();
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0]["id"], "q1");
        assert_eq!(questions[0]["options"].as_array().unwrap().len(), 4);
    }
}
