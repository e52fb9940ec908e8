pub mod health;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};

use crate::billing::handlers as billing;
use crate::extraction::handlers as extraction;
use crate::resume_import::handlers as resume_import;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Document extraction
        .route("/api/v1/documents/extract", post(extraction::handle_extract))
        // Resume import
        .route("/api/v1/resumes/import", post(resume_import::handle_import_resume))
        .route("/api/v1/resumes/parse", post(resume_import::handle_parse_resume))
        // Billing
        .route(
            "/api/v1/webhooks/lemon-squeezy",
            post(billing::handle_lemon_squeezy_webhook),
        )
        .layer(body_limit)
        .with_state(state)
}
