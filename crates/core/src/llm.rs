use crate::error::ProviderError;
use crate::models::ModelParams;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The completion capability injected into the orchestrator. One
/// request/response round-trip; no streaming.
#[async_trait]
pub trait CompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &ModelParams,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint. The timeout
/// applies per call; a timed-out call surfaces as a `ProviderError` and is
/// handled by the orchestrator like any other failed chunk.
pub struct GroqClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base(DEFAULT_API_BASE, api_key, timeout)
    }

    pub fn with_base(
        api_base: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(api_base)?.join("chat/completions")?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &ModelParams,
    ) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &params.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: compact_error_body(&message),
            });
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)
    }
}

/// Provider error bodies can be whole HTML pages; keep the readable part.
fn compact_error_body(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > 300 {
        compact.chars().take(300).collect()
    } else {
        compact
    }
}
