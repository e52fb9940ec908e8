use anyhow::{Context, Result};

use crate::billing::plans::PlanCatalog;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MIN_EXTRACTED_CHARS: usize = 50;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub webhook_secret: String,
    pub port: u16,
    pub rust_log: String,
    /// Usability floor: extractions shorter than this (in characters) are failures.
    pub min_extracted_chars: usize,
    pub max_upload_bytes: usize,
    /// Variant → plan tier table, read-only after startup.
    pub plans: PlanCatalog,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            webhook_secret: require_env("LEMON_SQUEEZY_WEBHOOK_SECRET")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            min_extracted_chars: parse_env("EXTRACT_MIN_CHARS", DEFAULT_MIN_EXTRACTED_CHARS)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            plans: std::env::var("BILLING_VARIANT_PLANS")
                .ok()
                .map(|raw| PlanCatalog::parse(&raw))
                .transpose()
                .context("BILLING_VARIANT_PLANS must look like '123=pro,456=premium'")?
                .unwrap_or_default(),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Config used by router tests. Never touches the environment.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/careerloom_test".to_string(),
            database_max_connections: 1,
            anthropic_api_key: "test-key".to_string(),
            anthropic_model: DEFAULT_MODEL.to_string(),
            webhook_secret: "whsec_test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            min_extracted_chars: DEFAULT_MIN_EXTRACTED_CHARS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            plans: PlanCatalog::parse("1001=pro,1002=premium").expect("valid test catalog"),
        }
    }
}
