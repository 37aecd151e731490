use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render::RenderError;
use crate::tagline::service::TaglineError;
use crate::tagline::validation::RequestError;
use crate::wizard::photo::UploadError;
use crate::wizard::WizardError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("All questions must be answered")]
    IncompleteAnswers { missing: Vec<String> },

    #[error("Another action is already in progress")]
    Busy,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Tagline service error: {0}")]
    Upstream(String),

    #[error("Tagline generation failed: {0}")]
    Tagline(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::IncompleteAnswers { missing } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "All questions must be answered", "missing": missing }),
            ),
            AppError::Busy => (
                StatusCode::CONFLICT,
                json!({ "error": "Another action is already in progress" }),
            ),
            AppError::UnsupportedMediaType(msg) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, json!({ "error": msg }))
            }
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": msg }))
            }
            AppError::Upstream(msg) => {
                tracing::error!("Tagline service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": "Failed to generate tagline. Please try again.",
                        "message": msg
                    }),
                )
            }
            AppError::Tagline(msg) => {
                tracing::error!("Tagline generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to generate tagline", "message": msg }),
                )
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Failed to download card. Please try again.",
                        "message": msg
                    }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error", "message": e.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// `Json` extractor whose rejections use the `{error}` body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            return AppError::UnsupportedMediaType(rejection.body_text());
        }
        AppError::Validation(rejection.body_text())
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Incomplete { missing } => AppError::IncompleteAnswers {
                missing: missing.iter().map(|q| q.as_str().to_string()).collect(),
            },
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<TaglineError> for AppError {
    fn from(err: TaglineError) -> Self {
        match err {
            TaglineError::Invalid(e) => e.into(),
            TaglineError::Rejected { message, missing } if !missing.is_empty() => {
                tracing::debug!("remote rejected request: {message}");
                AppError::IncompleteAnswers { missing }
            }
            TaglineError::Rejected { message, .. } => AppError::Validation(message),
            TaglineError::Timeout => AppError::Upstream("tagline request timed out".into()),
            TaglineError::Transport(msg) => AppError::Upstream(msg),
            TaglineError::Internal(msg) => AppError::Tagline(msg),
        }
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Tagline(e) => e.into(),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();
        match err {
            UploadError::UnsupportedType(_) => AppError::UnsupportedMediaType(message),
            UploadError::TooLarge(_) => AppError::PayloadTooLarge(message),
            UploadError::Decode(_) | UploadError::MissingFile => AppError::Validation(message),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err.to_string())
    }
}
