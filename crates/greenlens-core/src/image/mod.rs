//! Image generation module for GreenLens
//!
//! Provides text-to-image generation through the OpenAI images API
//! (`dall-e-3` by default). Images are hosted by the provider; only their
//! URLs are returned and stored.

mod client;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{ImageClient, ImageClientBuilder};
pub use types::{GeneratedImage, ImageRequest, ImageSize, first_sentence};

/// Text-to-image generation
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
}
