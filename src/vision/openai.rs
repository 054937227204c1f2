use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ModelClient, ModelError};
use crate::analysis::FoodAnalysis;
use crate::config::ModelConfig;

/// Chat-completions client for the vision/text model service.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, ModelError> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = resp.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(ModelError::Empty)
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn analyze_image(
        &self,
        image: &[u8],
        prompt: &str,
    ) -> Result<FoodAnalysis, ModelError> {
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(image));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: Content::Parts(vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ]),
            }],
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let content = self.chat(&request).await?;
        debug!(bytes = image.len(), "image analysis completed");
        serde_json::from_str(&content).map_err(|e| ModelError::Malformed(e.to_string()))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: Content::Text(prompt.to_string()),
            }],
            response_format: None,
        };
        self.chat(&request).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Content,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
