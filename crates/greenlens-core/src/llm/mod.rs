//! Text generation - OpenAI-compatible chat completions (Gemini by default)
//!
//! This module provides:
//! - `TextGenerator`, the seam the crisis and scan pipelines call through
//! - `LlmClient`, the HTTP implementation of that seam
//! - Request/response types matching the OpenAI-compatible API

mod client;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{LlmClient, LlmClientBuilder};
pub use types::{
    ChatRequest, ChatResponse, Choice, FinishReason, LlmResponse, Message, MessageRole,
    ResponseMessage, TextCompletion, Usage,
};

/// Single-prompt text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<TextCompletion>;
}
