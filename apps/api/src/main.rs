mod billing;
mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod resume_import;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::billing::store::PgBillingStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerLoom API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url, config.database_max_connections).await?;
    let billing_store = Arc::new(PgBillingStore::new(db));

    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.anthropic_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    info!(
        min_extracted_chars = config.min_extracted_chars,
        max_upload_bytes = config.max_upload_bytes,
        plan_variants = config.plans.len(),
        "Extraction and billing configured"
    );
    if config.plans.is_empty() {
        tracing::warn!("BILLING_VARIANT_PLANS is empty; subscription webhooks will not change tiers");
    }

    let state = AppState::new(config.clone(), llm, billing_store);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
