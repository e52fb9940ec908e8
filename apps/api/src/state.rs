use std::sync::Arc;

use crate::billing::store::BillingStore;
use crate::config::Config;
use crate::extraction::Extractor;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stateless; copied into blocking tasks per request.
    pub extractor: Extractor,
    pub llm: LlmClient,
    /// Subscription persistence. Default: Postgres.
    pub billing_store: Arc<dyn BillingStore>,
}

impl AppState {
    pub fn new(config: Config, llm: LlmClient, billing_store: Arc<dyn BillingStore>) -> Self {
        Self {
            extractor: Extractor::new(config.min_extracted_chars),
            config,
            llm,
            billing_store,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_state(billing_store: Arc<dyn BillingStore>) -> AppState {
    let config = Config::for_tests();
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.anthropic_model.clone())
        .expect("test HTTP client");
    AppState::new(config, llm, billing_store)
}
