//! Error types for GreenLens

use thiserror::Error;

/// Wait suggested to callers when a 429 carries no retry hint
pub(crate) const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Result type alias using GreenLens's Error
pub type Result<T> = std::result::Result<T, Error>;

/// GreenLens error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Auth errors (E001-E099)
    #[error("Could not validate credentials: {0}")]
    Unauthorized(String),

    // Network / provider errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("Text generation error: {0}. Check GEMINI_API_KEY.")]
    LlmError(String),

    #[error("Image generation error: {0}. Check OPENAI_API_KEY.")]
    ImageError(String),

    #[error("Rate limited by upstream provider (retry after {0} seconds)")]
    RateLimited(u64),

    // Scenario errors (E200-E299)
    #[error("Generated scenario is incomplete: expected years [{expected}], got [{found}]")]
    IncompleteScenario { expected: String, found: String },

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "E001",
            Self::NetworkError(_) => "E100",
            Self::LlmError(_) => "E101",
            Self::ImageError(_) => "E102",
            Self::RateLimited(_) => "E103",
            Self::IncompleteScenario { .. } => "E200",
            Self::DatabaseError(_) => "E400",
            Self::CorruptRecord(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Whether this error originated at an upstream AI provider
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_)
                | Self::LlmError(_)
                | Self::ImageError(_)
                | Self::RateLimited(_)
                | Self::IncompleteScenario { .. }
        )
    }

    /// Rate-limit error from a provider's 429 body
    pub(crate) fn rate_limited(body: &str) -> Self {
        Self::RateLimited(extract_retry_after(body).unwrap_or(DEFAULT_RETRY_AFTER_SECS))
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Unauthorized(_) => Some("Send `Authorization: Bearer <token>`".to_string()),
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::LlmError(_) => Some("greenlens doctor".to_string()),
            Self::ImageError(_) => Some("greenlens doctor".to_string()),
            Self::IncompleteScenario { .. } => {
                Some("greenlens config set crisis.strict_years false".to_string())
            }
            Self::ConfigError(_) => Some("greenlens config list".to_string()),
            _ => None,
        }
    }
}

/// Extract retry-after value from error response
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    json.get("retry_after")
        .and_then(|v| v.as_u64())
        .or_else(|| {
            json.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|v| v.as_u64())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::Unauthorized("x".into()).code(), "E001");
        assert_eq!(Error::LlmError("x".into()).code(), "E101");
        assert_eq!(Error::ImageError("x".into()).code(), "E102");
        assert_eq!(Error::InvalidInput("x".into()).code(), "E800");
        assert_eq!(Error::Other("x".into()).code(), "E9999");
    }

    #[test]
    fn test_upstream_classification() {
        assert!(Error::LlmError("quota".into()).is_upstream());
        assert!(Error::ImageError("down".into()).is_upstream());
        assert!(Error::RateLimited(30).is_upstream());
        assert!(!Error::InvalidInput("empty".into()).is_upstream());
        assert!(!Error::ConfigError("bad".into()).is_upstream());
    }

    #[test]
    fn test_incomplete_scenario_message() {
        let err = Error::IncompleteScenario {
            expected: "2030, 2050, 2100".to_string(),
            found: "2030".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2030, 2050, 2100"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_extract_retry_after() {
        assert_eq!(extract_retry_after(r#"{"retry_after": 30}"#), Some(30));
        assert_eq!(extract_retry_after(r#"{"error": {"retry_after": 60}}"#), Some(60));
        assert_eq!(extract_retry_after(r#"{"message": "rate limited"}"#), None);
        assert_eq!(extract_retry_after("not json"), None);
    }

    #[test]
    fn test_rate_limited_from_body() {
        assert!(matches!(Error::rate_limited(r#"{"retry_after": 5}"#), Error::RateLimited(5)));
        assert!(matches!(
            Error::rate_limited(""),
            Error::RateLimited(DEFAULT_RETRY_AFTER_SECS)
        ));
    }
}
