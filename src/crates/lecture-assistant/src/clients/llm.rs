//! Language model client.
//!
//! Steps only need single-turn text completion, so the trait is one prompt in,
//! one string out. [`OpenAiChatClient`] speaks the OpenAI-compatible
//! `/chat/completions` protocol, which also covers most self-hosted gateways.

use super::error::{ClientError, Result};
use crate::state::ModelSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Single-turn text completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider, model and temperature, recorded in step log entries
    fn settings(&self) -> ModelSettings;
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ClientError::MissingApiKey("OPENAI_API_KEY"));
        }
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClientError::InvalidResponse("response contained no choices".to_string()))
    }

    fn settings(&self) -> ModelSettings {
        ModelSettings::model("openai", &self.model, self.temperature)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = OpenAiChatClient::new("", "https://api.openai.com/v1", "gpt-4o-mini", 0.0, Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::MissingApiKey(_)));
    }

    #[test]
    fn test_settings_report_model() {
        let client =
            OpenAiChatClient::new("sk-test", "http://localhost:1234/v1/", "gpt-4o-mini", 0.0, Duration::from_secs(5))
                .unwrap();
        let settings = client.settings();
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(settings.temperature, Some(0.0));
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_response_parsing_tolerates_extra_fields() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"},"finish_reason":"stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));
    }
}
