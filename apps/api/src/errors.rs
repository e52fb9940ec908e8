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
    #[error("Validation error: {0}")]
    Validation(String),

    /// Declared media type is not one the extractor understands. Policy rejection,
    /// no extraction is attempted.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Extraction ran but recovered too little text. The client should offer manual paste.
    #[error("Could not extract enough text from {file_name}")]
    LowYieldExtraction { file_name: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::UnsupportedMediaType(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_MEDIA_TYPE"),
            AppError::LowYieldExtraction { .. } => (StatusCode::BAD_REQUEST, "EXTRACTION_LOW_YIELD"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Llm(_) => (StatusCode::INTERNAL_SERVER_ERROR, "LLM_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::UnsupportedMediaType(declared) => format!(
                "Unsupported file type '{declared}'. Upload a PDF, DOCX or plain text file."
            ),
            AppError::LowYieldExtraction { file_name } => format!(
                "Could not extract enough text from '{file_name}'. Please paste the text directly."
            ),
            AppError::Unauthorized => "Invalid or missing signature".to_string(),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                "An AI processing error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        let body = match &self {
            AppError::LowYieldExtraction { .. } => json!({
                "error": message,
                "code": code,
                "suggestion": "paste"
            }),
            _ => json!({
                "error": message,
                "code": code
            }),
        };

        (status, Json(body)).into_response()
    }
}
