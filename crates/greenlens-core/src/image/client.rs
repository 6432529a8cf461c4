//! Image generation client for the OpenAI images API
//!
//! Sends `POST {base_url}/images/generations` and returns the hosted image
//! URL. Only the first sentence of a prompt is forwarded.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, info};

use crate::config::{IMAGE_API_KEY_VAR, ImageConfig};
use crate::error::{Error, Result};

use super::ImageGenerator;
use super::types::{GeneratedImage, ImageRequest, ImageSize, ImagesResponse, first_sentence};

/// OpenAI API base URL
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default image model
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Image generation client
#[derive(Clone)]
pub struct ImageClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
    size: ImageSize,
}

impl std::fmt::Debug for ImageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("size", &self.size.to_string())
            .finish()
    }
}

/// Builder for ImageClient
pub struct ImageClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    size: Option<ImageSize>,
    timeout_secs: Option<u64>,
}

impl Default for ImageClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            size: None,
            timeout_secs: None,
        }
    }

    /// Take base URL, model, size and timeout from configuration
    pub fn config(mut self, config: &ImageConfig) -> Result<Self> {
        let size = ImageSize::parse(&config.size).ok_or_else(|| {
            Error::ConfigError(format!("Invalid image size '{}'", config.size))
        })?;
        self.base_url = Some(config.base_url.clone());
        self.model = Some(config.model.clone());
        self.size = Some(size);
        self.timeout_secs = Some(config.timeout_secs);
        Ok(self)
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL (defaults to OpenAI)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the model (defaults to dall-e-3)
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output size
    pub fn size(mut self, size: ImageSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the ImageClient
    pub fn build(self) -> Result<ImageClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::ConfigError("Image-generation API key is required".to_string()))?;

        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(120));

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::NetworkError)?;

        let base_url = self
            .base_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());

        Ok(ImageClient {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: self.model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            size: self.size.unwrap_or_default(),
        })
    }
}

impl ImageClient {
    /// Create a new ImageClient from configuration and an API key
    pub fn new(config: &ImageConfig, api_key: impl Into<String>) -> Result<Self> {
        ImageClientBuilder::new().config(config)?.api_key(api_key).build()
    }

    /// Create a client from configuration, reading the key from the environment
    pub fn from_config(config: &ImageConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| Error::ConfigError(format!("{} is not set", IMAGE_API_KEY_VAR)))?;
        Self::new(config, api_key)
    }

    /// Create a new builder
    pub fn builder() -> ImageClientBuilder {
        ImageClientBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Build the request body, truncating the prompt to its first sentence
    pub fn build_request(&self, prompt: &str) -> Result<ImageRequest> {
        let prompt = first_sentence(prompt);
        if prompt.is_empty() {
            return Err(Error::ImageError(
                "Image prompt is empty after truncation to its first sentence".to_string(),
            ));
        }
        Ok(ImageRequest::new(&self.model, prompt, self.size))
    }

    /// Generate an image and return its hosted URL
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let start = Instant::now();
        let request = self.build_request(prompt)?;
        let url = format!("{}/images/generations", self.base_url);

        debug!(model = %request.model, size = %request.size, "Sending image generation request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status, &body));
        }

        let images: ImagesResponse = response
            .json()
            .await
            .map_err(|e| Error::ImageError(format!("Failed to parse response: {}", e)))?;

        let image = extract_image(images)?;

        info!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Image generated"
        );

        Ok(image)
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        self.generate(prompt).await
    }
}

/// Pull the first image URL out of a provider response
fn extract_image(response: ImagesResponse) -> Result<GeneratedImage> {
    let data = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::ImageError("No images in response".to_string()))?;

    let url = data
        .url
        .ok_or_else(|| Error::ImageError("Image response carried no URL".to_string()))?;

    reqwest::Url::parse(&url)
        .map_err(|e| Error::ImageError(format!("Provider returned an invalid URL '{}': {}", url, e)))?;

    let image = GeneratedImage::new(url);
    Ok(match data.revised_prompt {
        Some(revised) => image.with_revised_prompt(revised),
        None => image,
    })
}

/// Map a non-success HTTP status to a provider error
fn map_error_status(status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::ImageError(format!(
            "Unauthorized ({}): check the {} environment variable",
            status,
            IMAGE_API_KEY_VAR
        )),
        400 => Error::ImageError(format!("Bad request: {}", body)),
        404 => Error::ImageError(format!("Model not found: {}", body)),
        429 => Error::rate_limited(body),
        500..=599 => Error::ImageError(format!("Server error ({}): {}", status, body)),
        _ => Error::ImageError(format!("HTTP error {}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ImageClient {
        ImageClientBuilder::new()
            .api_key("test-key")
            .base_url("https://images.example.com/v1/")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_key() {
        let result = ImageClientBuilder::new().build();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let client = test_client();
        assert_eq!(client.model(), "dall-e-3");
        assert_eq!(client.size(), ImageSize::Square1024);
        assert!(format!("{:?}", client).contains("https://images.example.com/v1\""));
    }

    #[test]
    fn test_builder_from_config() {
        let config = ImageConfig {
            size: "1792x1024".to_string(),
            model: "dall-e-2".to_string(),
            ..ImageConfig::default()
        };
        let client = ImageClient::new(&config, "k").unwrap();
        assert_eq!(client.model(), "dall-e-2");
        assert_eq!(client.size(), ImageSize::Landscape);
    }

    #[test]
    fn test_builder_rejects_bad_size() {
        let config = ImageConfig {
            size: "huge".to_string(),
            ..ImageConfig::default()
        };
        assert!(ImageClient::new(&config, "k").is_err());
    }

    #[test]
    fn test_build_request_forwards_first_sentence_only() {
        let client = test_client();
        let request = client
            .build_request("Photorealistic drought in Ankara. Cracked soil. Wide angle.")
            .unwrap();
        assert_eq!(request.prompt, "Photorealistic drought in Ankara");
        assert_eq!(request.size, "1024x1024");
        assert_eq!(request.n, 1);
    }

    #[test]
    fn test_build_request_rejects_empty_prompt() {
        let client = test_client();
        assert!(matches!(
            client.build_request(". nothing before the dot"),
            Err(Error::ImageError(_))
        ));
    }

    #[test]
    fn test_extract_image() {
        let response: ImagesResponse = serde_json::from_str(
            r#"{"data": [{"url": "https://cdn.example/x.png", "revised_prompt": "x"}]}"#,
        )
        .unwrap();
        let image = extract_image(response).unwrap();
        assert_eq!(image.url, "https://cdn.example/x.png");
        assert_eq!(image.revised_prompt.as_deref(), Some("x"));
    }

    #[test]
    fn test_extract_image_failures() {
        let empty: ImagesResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(extract_image(empty).is_err());

        let no_url: ImagesResponse = serde_json::from_str(r#"{"data": [{"b64_json": "AAAA"}]}"#).unwrap();
        assert!(extract_image(no_url).is_err());

        let bad_url: ImagesResponse = serde_json::from_str(r#"{"data": [{"url": "not a url"}]}"#).unwrap();
        assert!(extract_image(bad_url).is_err());
    }

    #[test]
    fn test_map_error_status() {
        use reqwest::StatusCode;

        let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, r#"{"error": {"retry_after": 20}}"#);
        assert!(matches!(err, Error::RateLimited(20)));
        assert!(err.is_upstream());

        let err = map_error_status(StatusCode::UNAUTHORIZED, "");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
