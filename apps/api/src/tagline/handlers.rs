//! Axum route handlers for tagline generation and the question catalog.

use axum::{extract::State, Json};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::tagline::questions::{Question, QUESTIONS};
use crate::tagline::validation::{GenerateTaglinePayload, TaglineRequest};

#[derive(Debug, Serialize)]
pub struct GenerateTaglineResponse {
    pub tagline: String,
}

/// POST /api/generate-tagline
///
/// Validates name, then the answers object, then each answer; only then
/// classifies and draws a tagline. Two identical requests may return
/// different taglines. An empty body counts as `{}`.
pub async fn handle_generate_tagline(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateTaglineResponse>, AppError> {
    let payload = parse_payload(&body)?;
    let request = TaglineRequest::try_from(payload)?;

    let (category, tagline) = state.generator.generate_for(&request.answers)?;

    info!(category = category.as_str(), "tagline generated");

    Ok(Json(GenerateTaglineResponse {
        tagline: tagline.to_string(),
    }))
}

fn parse_payload(body: &[u8]) -> Result<GenerateTaglinePayload, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateTaglinePayload::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Request body must be a JSON object: {e}")))
}

/// GET /api/questions
pub async fn handle_list_questions() -> Json<&'static [Question]> {
    Json(&QUESTIONS[..])
}
