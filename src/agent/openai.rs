//! OpenAI-compatible chat completions client
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! with bearer authentication.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::agent::protocol::{Prompt, TextGenerator};
use crate::config::LlmConfig;
use crate::error::{OracleError, Result};

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat completions request
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat completions response
#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Query generation wants repeatable output, interpretation a little variety
const QUERY_TEMPERATURE: f32 = 0.0;
const INTERPRETATION_TEMPERATURE: f32 = 0.3;

/// OpenAI-compatible API client
pub struct OpenAiClient {
    config: LlmConfig,
    http: Client,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: LlmConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(OracleError::Configuration(
                "text-generation API key not configured".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, prompt: &Prompt, temperature: f32) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            temperature: Some(temperature),
            max_tokens: Some(self.config.max_tokens),
        }
    }

    /// Send a two-message chat and return the first choice's text
    async fn chat(&self, prompt: &Prompt, temperature: f32) -> Result<String> {
        debug!("Sending request to chat completions API");

        let request = self.build_request(prompt, temperature);
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Chat completions API error: {} - {}", status, body);
            return Err(OracleError::generation(
                "chat completions",
                format!("API returned status {}", status),
            ));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            OracleError::generation("chat completions", format!("unparseable response: {}", e))
        })?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("Chat completions response received: {} chars", content.len());
        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate_query(&self, prompt: &Prompt) -> Result<String> {
        self.chat(prompt, QUERY_TEMPERATURE).await
    }

    async fn generate_interpretation(&self, prompt: &Prompt) -> Result<String> {
        self.chat(prompt, INTERPRETATION_TEMPERATURE).await
    }
}
