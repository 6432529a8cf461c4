//! Chat completion client for the text-generation provider
//!
//! Provides an async HTTP client for OpenAI-compatible chat completions.
//! Provider failures are surfaced as-is; the client never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, info};

use crate::config::{LLM_API_KEY_VAR, LlmConfig};
use crate::error::{Error, Result};

use super::TextGenerator;
use super::types::{ChatRequest, ChatResponse, LlmResponse, Message, TextCompletion};

/// Gemini's OpenAI-compatible base URL
const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Text-generation client
///
/// Cheap to clone; the underlying HTTP connection pool is shared.
#[derive(Clone)]
pub struct LlmClient {
    http_client: HttpClient,
    config: LlmConfig,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

/// Builder for creating an LlmClient
pub struct LlmClientBuilder {
    config: Option<LlmConfig>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for LlmClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: None,
            api_key: None,
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Set the LLM configuration
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the base URL from the configuration
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the LlmClient
    pub fn build(self) -> Result<LlmClient> {
        let config = self.config.unwrap_or_default();
        let api_key = self
            .api_key
            .ok_or_else(|| Error::ConfigError("Text-generation API key is required".to_string()))?;

        let timeout_secs = self.timeout_secs.unwrap_or(config.timeout_secs);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::NetworkError)?;

        let base_url = self
            .base_url
            .or_else(|| Some(config.base_url.clone()).filter(|u| !u.is_empty()))
            .unwrap_or_else(|| GEMINI_OPENAI_BASE_URL.to_string());

        Ok(LlmClient {
            http_client,
            config,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl LlmClient {
    /// Create a new LlmClient with the given configuration and API key
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        LlmClientBuilder::new()
            .config(config)
            .api_key(api_key)
            .build()
    }

    /// Create a client from configuration, reading the key from the environment
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| Error::ConfigError(format!("{} is not set", LLM_API_KEY_VAR)))?;
        Self::new(config.clone(), api_key)
    }

    /// Create a new builder for LlmClient
    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::new()
    }

    /// Get the configured model
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the resolved base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request body for a list of messages
    pub fn build_request(&self, messages: Vec<Message>) -> ChatRequest {
        ChatRequest::new(&self.config.model, messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
    }

    /// Make a chat completion request
    pub async fn complete(&self, messages: Vec<Message>) -> Result<LlmResponse> {
        let request = self.build_request(messages);
        self.send_request(&request).await
    }

    /// Send a single request to the API
    async fn send_request(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status, &body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::LlmError(format!("Failed to parse response: {}", e)))?;

        let llm_response = LlmResponse::from_chat_response(chat_response)
            .ok_or_else(|| Error::LlmError("Empty response from API".to_string()))?;

        info!(
            model = %llm_response.model,
            tokens = llm_response.tokens_used,
            finish_reason = %llm_response.finish_reason,
            "Chat completion successful"
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate_text(&self, prompt: &str) -> Result<TextCompletion> {
        let response = self.complete(vec![Message::user(prompt)]).await?;
        Ok(TextCompletion::new(response.content))
    }
}

/// Map a non-success HTTP status to a provider error
fn map_error_status(status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::LlmError(format!(
            "Unauthorized ({}): check the {} environment variable",
            status,
            LLM_API_KEY_VAR
        )),
        429 => Error::rate_limited(body),
        400 => Error::LlmError(format!("Bad request: {}", body)),
        404 => Error::LlmError(format!(
            "Model not found or endpoint unavailable: {}",
            body
        )),
        500..=599 => Error::LlmError(format!("Server error ({}): {}", status, body)),
        _ => Error::LlmError(format!("HTTP error {}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            base_url: "https://example.com/v1/".to_string(),
            model: "test/model".to_string(),
            temperature: 0.4,
            max_tokens: 1024,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_client_builder() {
        let client = LlmClient::builder()
            .config(test_config())
            .api_key("test-key")
            .base_url("https://override.example.com")
            .timeout_secs(60)
            .build()
            .unwrap();

        assert_eq!(client.model(), "test/model");
        assert_eq!(client.base_url(), "https://override.example.com");
    }

    #[test]
    fn test_base_url_from_config_is_trimmed() {
        let client = LlmClient::new(test_config(), "test-key").unwrap();
        assert_eq!(client.base_url(), "https://example.com/v1");
    }

    #[test]
    fn test_client_builder_requires_api_key() {
        let result = LlmClient::builder().config(test_config()).build();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_build_request_uses_config() {
        let client = LlmClient::new(test_config(), "test-key").unwrap();
        let request = client.build_request(vec![Message::user("topic")]);
        assert_eq!(request.model, "test/model");
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.max_tokens, Some(1024));
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_client_debug_hides_key() {
        let client = LlmClient::new(test_config(), "secret-key").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("LlmClient"));
        assert!(debug.contains("test/model"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn test_client_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LlmClient>();
    }

    #[test]
    fn test_map_error_status() {
        use reqwest::StatusCode;

        assert!(matches!(
            map_error_status(StatusCode::TOO_MANY_REQUESTS, r#"{"retry_after": 12}"#),
            Error::RateLimited(12)
        ));
        assert!(matches!(
            map_error_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            Error::RateLimited(crate::error::DEFAULT_RETRY_AFTER_SECS)
        ));
        assert!(matches!(
            map_error_status(StatusCode::BAD_GATEWAY, "upstream"),
            Error::LlmError(msg) if msg.contains("Server error")
        ));
        assert!(matches!(
            map_error_status(StatusCode::UNAUTHORIZED, ""),
            Error::LlmError(msg) if msg.contains("GEMINI_API_KEY")
        ));
    }

}
