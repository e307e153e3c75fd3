use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// An upload declared a content type other than PDF or plain text.
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// An upload's bytes could not be read as the declared type.
    #[error("Unreadable upload: {0}")]
    BadUpload(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The model credential was never configured and test mode is off.
    #[error("Google Gemini API key is not configured on the server")]
    MissingApiKey,

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UnsupportedMedia(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            AppError::BadUpload(msg) => (StatusCode::BAD_REQUEST, "BAD_UPLOAD", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MISSING_API_KEY",
                self.to_string(),
            ),
            // Unlike most 500s, the LLM message is returned to the caller:
            // the response contract carries the underlying cause and the
            // failing stage so callers can tell which call broke.
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "LLM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
