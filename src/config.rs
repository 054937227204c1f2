use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        // No DATABASE_URL means local development on the embedded store.
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:nutrilog.db".into());
        let model = ModelConfig {
            api_key: std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
        };
        Ok(Self {
            database_url,
            model,
        })
    }
}
