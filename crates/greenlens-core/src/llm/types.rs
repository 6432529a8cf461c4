//! Types for OpenAI-compatible chat completion APIs
//!
//! Gemini exposes the same request/response shape under its `/openai`
//! endpoint, so one set of types covers the default provider and any
//! compatible replacement.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions/context)
    System,
    /// User message (human input)
    User,
    /// Assistant message (LLM response)
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message sent to the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Request body for chat completions
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gemini-1.5-flash")
    pub model: String,
    /// List of messages in the conversation
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl ChatRequest {
    /// Create a new chat request with required fields
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage information from the API response
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::Length => write!(f, "length"),
            FinishReason::ContentFilter => write!(f, "content_filter"),
            FinishReason::Unknown => write!(f, "unknown"),
        }
    }
}

/// Assistant message as returned by the provider (content may be null)
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

/// A single completion choice from the API response
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: usize,
    pub message: ResponseMessage,
    pub finish_reason: Option<FinishReason>,
}

/// Response from the chat completions API
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

/// Simplified response returned by the LLM client
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated content
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Total tokens used (input + output)
    pub tokens_used: u32,
    /// Reason for stopping
    pub finish_reason: FinishReason,
}

impl LlmResponse {
    /// Build from an API response; `None` when there is no usable text
    pub fn from_chat_response(response: ChatResponse) -> Option<Self> {
        let choice = response.choices.first()?;
        let content = choice.message.content.clone()?;
        if content.trim().is_empty() {
            return None;
        }

        Some(Self {
            content,
            model: response.model,
            tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
            finish_reason: choice
                .finish_reason
                .clone()
                .unwrap_or(FinishReason::Unknown),
        })
    }
}

/// Text produced by a text-generation provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCompletion {
    pub text: String,
}

impl TextCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
