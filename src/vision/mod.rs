pub mod openai;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::FoodAnalysis;

/// Failures at the external model boundary. All of them are surfaced to the
/// caller as "no result"; the core never retries internally.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response was not valid JSON: {0}")]
    Malformed(String),
    #[error("model returned an empty completion")]
    Empty,
}

/// Opaque vision/text model service. A scripted fake stands in for it in
/// tests; production uses the chat-completions client in [`openai`].
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Analyze a meal photo into a structured record. A timeout or malformed
    /// reply is an error; no partial analysis is ever produced.
    async fn analyze_image(
        &self,
        image: &[u8],
        prompt: &str,
    ) -> Result<FoodAnalysis, ModelError>;

    /// Generate free-form text from a prompt (plans and reports).
    async fn generate_text(&self, prompt: &str) -> Result<String, ModelError>;
}
