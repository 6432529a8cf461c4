//! Image generation types
//!
//! Request and response types for the images API.

use serde::{Deserialize, Serialize};

/// Image size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    /// 1024x1024 square image
    #[default]
    Square1024,
    /// 1024x1792 portrait image
    Portrait,
    /// 1792x1024 landscape image
    Landscape,
    /// Custom dimensions
    Custom(u32, u32),
}

impl ImageSize {
    /// Get width and height as a tuple
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Square1024 => (1024, 1024),
            Self::Portrait => (1024, 1792),
            Self::Landscape => (1792, 1024),
            Self::Custom(w, h) => (*w, *h),
        }
    }

    /// Parse from string (e.g., "square", "portrait", "landscape", "1024x768")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "square" | "1024x1024" => Some(Self::Square1024),
            "portrait" | "1024x1792" => Some(Self::Portrait),
            "landscape" | "1792x1024" => Some(Self::Landscape),
            s => {
                let (w, h) = s.split_once('x')?;
                let w: u32 = w.trim().parse().ok()?;
                let h: u32 = h.trim().parse().ok()?;
                if w == 0 || h == 0 {
                    return None;
                }
                Some(Self::Custom(w, h))
            }
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{}x{}", w, h)
    }
}

/// Request body for `POST /images/generations`
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    /// Model to use for generation
    pub model: String,
    /// Text description of the image to generate
    pub prompt: String,
    /// Size as `WIDTHxHEIGHT`
    pub size: String,
    /// Number of images; always one per scenario year
    pub n: u32,
}

impl ImageRequest {
    /// Create a single-image request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, size: ImageSize) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            size: size.to_string(),
            n: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImageData {
    pub url: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImagesResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

/// An image hosted by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Where the provider serves the image
    pub url: String,
    /// Model's interpretation of the prompt (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

impl GeneratedImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            revised_prompt: None,
        }
    }

    pub fn with_revised_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.revised_prompt = Some(prompt.into());
        self
    }
}

/// Text before the first `.`, trimmed
///
/// Image prompts are cut to one sentence before they reach the provider.
pub fn first_sentence(s: &str) -> &str {
    s.split('.').next().unwrap_or_default().trim()
}
