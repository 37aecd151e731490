use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{AppError, AppJson};
use crate::render::CardContent;
use crate::state::AppState;
use crate::tagline::questions::QuestionId;
use crate::wizard::gradients::{gradient_or_default, GradientView, GRADIENTS};
use crate::wizard::photo::{is_accepted_type, PhotoPreview, UploadError};
use crate::wizard::session::Session;
use crate::wizard::{WizardError, WizardSnapshot, WizardStep};

const PHOTO_FIELD: &str = "photo";

#[derive(Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// An action is still running; `wizard` is the state before it.
    pub busy: bool,
    pub wizard: WizardSnapshot,
}

fn view_of(session: &Session, busy: bool) -> SessionView {
    SessionView {
        id: session.id,
        created_at: session.created_at,
        busy,
        wizard: session.snapshot(),
    }
}

#[derive(Deserialize)]
pub struct AnswerBody {
    pub answer: String,
}

#[derive(Deserialize)]
pub struct NameBody {
    pub name: String,
}

#[derive(Deserialize)]
pub struct PositionBody {
    pub position: u16,
}

#[derive(Deserialize)]
pub struct GradientBody {
    pub gradient_id: String,
}

/// GET /api/gradients
pub async fn handle_list_gradients() -> Json<Vec<GradientView>> {
    Json(GRADIENTS.iter().map(GradientView::from).collect())
}

/// POST /api/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let session = state.sessions.create()?;
    Ok((StatusCode::CREATED, Json(view_of(&session, false))))
}

/// GET /api/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    Ok(Json(view_of(&session, session.is_busy())))
}

/// DELETE /api/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/sessions/:id/answers/:question
pub async fn handle_set_answer(
    State(state): State<AppState>,
    Path((id, question)): Path<(Uuid, String)>,
    AppJson(body): AppJson<AnswerBody>,
) -> Result<Json<SessionView>, AppError> {
    let question = QuestionId::parse(&question)
        .ok_or_else(|| AppError::NotFound(format!("Question {question} not found")))?;
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.set_answer(question, &body.answer)?;
    Ok(Json(view_of(&session, false)))
}

/// POST /api/sessions/:id/questions/next
pub async fn handle_next_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.next_question()?;
    Ok(Json(view_of(&session, false)))
}

/// POST /api/sessions/:id/questions/previous
pub async fn handle_previous_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.previous_question();
    Ok(Json(view_of(&session, false)))
}

/// PUT /api/sessions/:id/name
pub async fn handle_set_name(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<NameBody>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.set_name(&body.name);
    Ok(Json(view_of(&session, false)))
}

/// POST /api/sessions/:id/photo
///
/// Multipart upload, field `photo`. The declared type is checked before the
/// body is read; size and decodability after.
pub async fn handle_upload_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let mime = field.content_type().unwrap_or_default().to_string();
        if !is_accepted_type(&mime) {
            return Err(UploadError::UnsupportedType(mime).into());
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, mime, bytes));
        break;
    }
    let (file_name, mime, bytes) = upload.ok_or(UploadError::MissingFile)?;
    debug!(session_id = %id, bytes = bytes.len(), %mime, "photo received");

    let photo = tokio::task::spawn_blocking(move || PhotoPreview::decode(file_name, &mime, &bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("photo decode task failed: {e}")))??;

    let (width, height) = photo.dimensions();
    session.wizard().await.set_photo(photo);
    info!(session_id = %id, width, height, "photo accepted");

    Ok(Json(view_of(&session, false)))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(UploadError::TooLarge(0).to_string());
    }
    AppError::Validation(err.body_text())
}

/// PUT /api/sessions/:id/photo/position
pub async fn handle_set_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<PositionBody>,
) -> Result<Json<SessionView>, AppError> {
    let position = u8::try_from(body.position).map_err(|_| WizardError::InvalidPosition)?;
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.set_image_position(position)?;
    Ok(Json(view_of(&session, false)))
}

/// PUT /api/sessions/:id/gradient
pub async fn handle_select_gradient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<GradientBody>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.select_gradient(&body.gradient_id)?;
    Ok(Json(view_of(&session, false)))
}

/// POST /api/sessions/:id/next
///
/// Leaving the gradient step waits for a tagline. Concurrent actions on the
/// same session are rejected with 409 until it settles.
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    let step = session
        .wizard()
        .await
        .advance(state.tagline_service.as_ref(), state.config.tagline_timeout())
        .await?;
    info!(session_id = %id, ?step, "session advanced");
    Ok(Json(view_of(&session, false)))
}

/// POST /api/sessions/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.back()?;
    Ok(Json(view_of(&session, false)))
}

/// POST /api/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session.wizard().await.reset();
    info!(session_id = %id, "session reset");
    Ok(Json(view_of(&session, false)))
}

/// POST /api/sessions/:id/regenerate
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;
    session
        .wizard()
        .await
        .regenerate(state.tagline_service.as_ref(), state.config.tagline_timeout())
        .await?;
    Ok(Json(view_of(&session, false)))
}

/// GET /api/sessions/:id/card.png
///
/// Renders the preview as a PNG download. Only available on the preview
/// step; rendering runs on a blocking task.
pub async fn handle_download_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    let _guard = session.begin()?;

    let content = {
        let wizard = session.wizard().await;
        if wizard.step() != WizardStep::Preview {
            return Err(AppError::Validation(
                "The card can only be downloaded from the preview".into(),
            ));
        }
        let form = wizard.form();
        CardContent {
            name: form.name.trim().to_string(),
            tagline: wizard.tagline().map(str::to_string),
            photo: form.photo.as_ref().map(|p| Arc::clone(&p.bitmap)),
            image_position: form.image_position,
            gradient: gradient_or_default(form.gradient_id),
        }
    };

    let renderer = state.renderer;
    let export = tokio::task::spawn_blocking(move || renderer.export_png(&content))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("render task failed: {e}")))??;

    info!(
        session_id = %id,
        width = export.width,
        height = export.height,
        bytes = export.bytes.len(),
        "card exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.bytes,
    ))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, Response},
        Router,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::routes::build_router;
    use crate::tagline::questions::*;
    use crate::wizard::photo::{png_fixture, MAX_PHOTO_BYTES};

    use super::*;

    fn test_state() -> AppState {
        AppState::for_tests(Config::for_tests(), StdRng::seed_from_u64(3))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_of(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_request(uri: &str, mime: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "cozycard-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"me.png\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_session(app: &Router) -> String {
        let response = send(app, "POST", "/api/sessions", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_of(response).await["id"].as_str().unwrap().to_string()
    }

    async fn answer_all(app: &Router, id: &str) {
        let answers = [
            ("q1", Q1_CALM),
            ("q2", Q2_READ),
            ("q3", Q3_SIMPLE),
            ("q4", Q4_ALONE),
            ("q5", Q5_GRATEFUL),
        ];
        for (key, answer) in answers {
            let uri = format!("/api/sessions/{id}/answers/{key}");
            let response = send(app, "PUT", &uri, Some(json!({ "answer": answer }))).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    /// Creates a session and walks it to the preview step under `name`.
    async fn session_at_preview(app: &Router, name: &str) -> String {
        let id = create_session(app).await;
        answer_all(app, &id).await;
        send(app, "POST", &format!("/api/sessions/{id}/next"), None).await;
        send(app, "PUT", &format!("/api/sessions/{id}/name"), Some(json!({ "name": name }))).await;
        send(app, "POST", &format!("/api/sessions/{id}/next"), None).await;
        let upload = multipart_request(
            &format!("/api/sessions/{id}/photo"),
            "image/png",
            &png_fixture(10, 10),
        );
        app.clone().oneshot(upload).await.unwrap();
        send(app, "POST", &format!("/api/sessions/{id}/next"), None).await;
        let body = json_of(send(app, "POST", &format!("/api/sessions/{id}/next"), None).await).await;
        assert_eq!(body["wizard"]["step"], "preview");
        id
    }

    #[tokio::test]
    async fn test_download_name_cannot_inject_header_parameters() {
        let app = build_router(test_state());
        let id = session_at_preview(&app, "O\"Brien; filename=evil.exe").await;
        let response = send(&app, "GET", &format!("/api/sessions/{id}/card.png"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"obrien-filenameevilexe.png\""
        );
    }

    #[tokio::test]
    async fn test_download_with_control_character_in_name() {
        let app = build_router(test_state());
        let id = session_at_preview(&app, "Al\u{1}ex").await;
        let response = send(&app, "GET", &format!("/api/sessions/{id}/card.png"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"alex.png\""
        );
    }

    #[tokio::test]
    async fn test_get_session_does_not_wait_for_running_action() {
        let state = test_state();
        let app = build_router(state.clone());
        let session = state.sessions.create().unwrap();
        session.wizard().await.set_name("Alex");
        let uri = format!("/api/sessions/{}", session.id);
        send(&app, "GET", &uri, None).await;

        // Simulate an action holding the wizard across a slow tagline call.
        let _guard = session.begin().unwrap();
        let _locked = session.wizard().await;

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            send(&app, "GET", &uri, None),
        )
        .await
        .expect("read blocked on the wizard lock");
        let body = json_of(response).await;
        assert_eq!(body["busy"], true);
        assert_eq!(body["wizard"]["name"], "Alex");
    }

    #[tokio::test]
    async fn test_full_flow_to_download() {
        let app = build_router(test_state());
        let id = create_session(&app).await;

        answer_all(&app, &id).await;
        let body = json_of(send(&app, "POST", &format!("/api/sessions/{id}/next"), None).await).await;
        assert_eq!(body["wizard"]["step"], "name");

        send(&app, "PUT", &format!("/api/sessions/{id}/name"), Some(json!({ "name": "Alex" }))).await;
        let body = json_of(send(&app, "POST", &format!("/api/sessions/{id}/next"), None).await).await;
        assert_eq!(body["wizard"]["step"], "photo");

        let upload = multipart_request(
            &format!("/api/sessions/{id}/photo"),
            "image/png",
            &png_fixture(40, 60),
        );
        let response = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_of(response).await;
        assert_eq!(body["wizard"]["photo"]["width"], 40);
        assert_eq!(body["wizard"]["image_position"], 50);

        send(&app, "POST", &format!("/api/sessions/{id}/next"), None).await;
        let response = send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/gradient"),
            Some(json!({ "gradient_id": "forest_mist" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_of(send(&app, "POST", &format!("/api/sessions/{id}/next"), None).await).await;
        assert_eq!(body["wizard"]["step"], "preview");
        assert!(body["wizard"]["tagline"].is_string());
        assert!(body["wizard"]["progress"].is_null());

        let response = send(&app, "GET", &format!("/api/sessions/{id}/card.png"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"alex.png\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_advance_blocked_by_guard_keeps_step() {
        let app = build_router(test_state());
        let id = create_session(&app).await;

        let response = send(&app, "POST", &format!("/api/sessions/{id}/next"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["error"], "Please answer all questions");

        let body = json_of(send(&app, "GET", &format!("/api/sessions/{id}"), None).await).await;
        assert_eq!(body["wizard"]["step"], "questions");
        assert_eq!(body["wizard"]["error"], "Please answer all questions");
    }

    #[tokio::test]
    async fn test_unknown_session_and_question() {
        let app = build_router(test_state());
        let missing = Uuid::new_v4();
        let response = send(&app, "GET", &format!("/api/sessions/{missing}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let id = create_session(&app).await;
        let response = send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/answers/q9"),
            Some(json!({ "answer": Q1_CALM })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unlisted_answer_rejected() {
        let app = build_router(test_state());
        let id = create_session(&app).await;
        let response = send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/answers/q1"),
            Some(json!({ "answer": "Sleepy" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let app = build_router(test_state());
        let id = create_session(&app).await;
        let request = multipart_request(&format!("/api/sessions/{id}/photo"), "image/gif", b"GIF89a");
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            json_of(response).await["error"],
            "Please upload a valid image file (JPG, PNG, or WebP)"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_file() {
        let app = build_router(test_state());
        let id = create_session(&app).await;
        let bytes = vec![0u8; MAX_PHOTO_BYTES + 1];
        let request = multipart_request(&format!("/api/sessions/{id}/photo"), "image/png", &bytes);
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_of(response).await["error"], "File size must be less than 5MB");
    }

    #[tokio::test]
    async fn test_busy_session_rejects_second_action() {
        let state = test_state();
        let app = build_router(state.clone());
        let session = state.sessions.create().unwrap();
        let _guard = session.begin().unwrap();

        let uri = format!("/api/sessions/{}/name", session.id);
        let response = send(&app, "PUT", &uri, Some(json!({ "name": "Alex" }))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(session.wizard().await.form().name, "");
    }

    #[tokio::test]
    async fn test_download_requires_preview() {
        let app = build_router(test_state());
        let id = create_session(&app).await;
        let response = send(&app, "GET", &format!("/api/sessions/{id}/card.png"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_position_out_of_range() {
        let app = build_router(test_state());
        let id = create_session(&app).await;
        let uri = format!("/api/sessions/{id}/photo/position");
        let response = send(&app, "PUT", &uri, Some(json!({ "position": 101 }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = send(&app, "PUT", &uri, Some(json!({ "position": 0 }))).await;
        assert_eq!(json_of(response).await["wizard"]["image_position"], 0);
    }

    #[tokio::test]
    async fn test_reset_and_delete() {
        let app = build_router(test_state());
        let id = create_session(&app).await;
        answer_all(&app, &id).await;

        let body = json_of(send(&app, "POST", &format!("/api/sessions/{id}/reset"), None).await).await;
        assert_eq!(body["wizard"]["answers"]["q1"], "");
        assert_eq!(body["wizard"]["gradient_id"], "ocean_depth");

        let response = send(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_gradients() {
        let app = build_router(test_state());
        let body = json_of(send(&app, "GET", "/api/gradients", None).await).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 6);
        assert_eq!(list[0]["id"], "ocean_depth");
        assert_eq!(list[0]["stops"].as_array().unwrap().len(), 3);
    }
}
