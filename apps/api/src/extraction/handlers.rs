//! Axum route handlers for the extraction API.

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::upload::{read_uploaded_file, UploadedFile};
use crate::extraction::{Extractor, InputDocument, MediaType};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub text: String,
}

/// POST /api/v1/documents/extract
///
/// Multipart upload (`file`) of a PDF, DOCX or plain text document.
/// Returns the recovered text, or 400 with `suggestion: "paste"` when too little
/// text could be recovered.
pub async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let upload = read_uploaded_file(multipart).await?;
    let text = extract_upload(state.extractor, upload).await?;
    Ok(Json(ExtractResponse { text }))
}

/// Resolves the media type of an upload and runs extraction on the blocking pool.
pub async fn extract_upload(extractor: Extractor, upload: UploadedFile) -> Result<String, AppError> {
    let media_type = MediaType::detect(upload.content_type.as_deref(), &upload.file_name)
        .map_err(|rejected| {
            info!(file = %upload.file_name, declared = %rejected.0, "rejected unsupported upload");
            AppError::UnsupportedMediaType(rejected.0)
        })?;

    let file_name = upload.file_name.clone();
    let size = upload.data.len();
    let document = InputDocument {
        bytes: upload.data,
        media_type,
        file_name: upload.file_name,
    };

    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || extractor.extract(&document))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if !result.success {
        info!(
            file = %file_name,
            ?media_type,
            bytes = size,
            strategy = ?result.strategy,
            elapsed_ms,
            "extraction below usability floor"
        );
        return Err(AppError::LowYieldExtraction { file_name });
    }

    info!(
        file = %file_name,
        ?media_type,
        bytes = size,
        strategy = ?result.strategy,
        chars = result.text.chars().count(),
        elapsed_ms,
        "document extracted"
    );
    Ok(result.text)
}
