//! OpenAI-compatible chat completion client

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, instrument, warn};

use super::ChatModel;
use crate::config::ModelConfig;
use crate::{EventWiseError, Result};

pub struct OpenAiChatModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatModel {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("EventWise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EventWiseError::generation(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature: 0.7,
            max_tokens: 400,
        })
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| EventWiseError::ConfigurationMissing {
                missing: vec!["OPENAI_API_KEY".to_string()],
            })?;

        let model = Self::new(api_key, config.base_url.clone(), config.model.clone())?;
        Ok(model.with_sampling(config.temperature, config.max_tokens))
    }

    #[must_use]
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn status_error(status: StatusCode, body: &str) -> EventWiseError {
        match status {
            StatusCode::UNAUTHORIZED => {
                error!("Model provider rejected the API key");
                EventWiseError::invalid_credentials("OpenAI")
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Model provider rate limit hit");
                EventWiseError::RateLimitExceeded
            }
            _ => {
                let message = api::error_message(body).unwrap_or_else(|| {
                    format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown error")
                    )
                });
                warn!("Model provider error {}: {}", status, message);
                EventWiseError::provider(message)
            }
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = api::ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                api::ChatMessage {
                    role: "system",
                    content: system,
                },
                api::ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let start_time = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EventWiseError::generation(format!("Request failed: {e}")))?;

        let status = response.status();
        debug!(
            "Model provider response {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body));
        }

        let completion: api::ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| EventWiseError::generation(format!("Invalid completion response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| EventWiseError::generation("Completion contained no choices"))
    }
}

mod api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct ChatCompletionRequest<'a> {
        pub model: &'a str,
        pub messages: Vec<ChatMessage<'a>>,
        pub temperature: f32,
        pub max_tokens: u32,
    }

    #[derive(Debug, Serialize)]
    pub struct ChatMessage<'a> {
        pub role: &'static str,
        pub content: &'a str,
    }

    #[derive(Debug, Deserialize)]
    pub struct ChatCompletionResponse {
        #[serde(default)]
        pub choices: Vec<Choice>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Choice {
        pub message: ResponseMessage,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseMessage {
        pub content: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Debug, Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    /// `error.message` from an OpenAI error body
    pub fn error_message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|b| b.error.message)
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model(server: &MockServer) -> OpenAiChatModel {
        OpenAiChatModel::new("test-key".into(), server.uri(), "gpt-4".into()).unwrap()
    }

    #[tokio::test]
    async fn test_completion_is_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "temperature": 0.7,
                "max_tokens": 400,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "  Go to the Art Expo.\n"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = model(&server).complete("sys", "hello").await.unwrap();
        assert_eq!(text, "Go to the Art Expo.");
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached for gpt-4", "type": "requests"}
            })))
            .mount(&server)
            .await;

        let err = model(&server).complete("sys", "hello").await.unwrap_err();
        assert!(matches!(err, EventWiseError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = model(&server).complete("sys", "hello").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid OpenAI API key");
    }

    #[tokio::test]
    async fn test_provider_error_passes_message_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"message": "The server had an error"}
            })))
            .mount(&server)
            .await;

        let err = model(&server).complete("sys", "hello").await.unwrap_err();
        assert!(matches!(err, EventWiseError::ProviderError { .. }));
        assert!(err.to_string().contains("The server had an error"));
        assert!(!err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = model(&server).complete("sys", "hello").await.unwrap_err();
        assert!(matches!(err, EventWiseError::GenerationFailed { .. }));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ModelConfig {
            api_key: None,
            ..ModelConfig::default()
        };
        let err = OpenAiChatModel::from_config(&config).err().unwrap();
        assert!(matches!(err, EventWiseError::ConfigurationMissing { .. }));
    }
}
