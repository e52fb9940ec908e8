//! Axum route handlers for resume import.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::handlers::extract_upload;
use crate::extraction::upload::read_uploaded_file;
use crate::llm_client::LlmClient;
use crate::resume_import::models::ParsedResume;
use crate::resume_import::prompts::{build_resume_parse_prompt, RESUME_PARSE_SYSTEM};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseResumeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResumeResponse {
    pub resume: ParsedResume,
}

#[derive(Debug, Serialize)]
pub struct ImportResumeResponse {
    pub text: String,
    pub resume: ParsedResume,
}

/// POST /api/v1/resumes/parse
///
/// Structures pasted resume text. This is where clients land after an upload
/// fails with `suggestion: "paste"`.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    Json(request): Json<ParseResumeRequest>,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let resume = parse_resume_text(&state.llm, text).await?;
    Ok(Json(ParseResumeResponse { resume }))
}

/// POST /api/v1/resumes/import
///
/// Upload → text extraction → AI parsing, in one call.
pub async fn handle_import_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImportResumeResponse>, AppError> {
    let upload = read_uploaded_file(multipart).await?;
    let text = extract_upload(state.extractor, upload).await?;
    let resume = parse_resume_text(&state.llm, &text).await?;
    Ok(Json(ImportResumeResponse { text, resume }))
}

async fn parse_resume_text(llm: &LlmClient, text: &str) -> Result<ParsedResume, AppError> {
    let prompt = build_resume_parse_prompt(text);
    let resume = llm
        .complete_json::<ParsedResume>(&prompt, RESUME_PARSE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Resume parsing failed: {e}")))?
        .tidy();

    info!(
        experience = resume.experience.len(),
        education = resume.education.len(),
        skills = resume.skills.len(),
        "resume parsed"
    );
    Ok(resume)
}
