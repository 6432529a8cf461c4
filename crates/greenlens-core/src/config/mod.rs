//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::image::ImageSize;

/// Environment variable holding the text-generation provider key
pub const LLM_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Environment variable holding the image-generation provider key
pub const IMAGE_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable holding the HS256 token secret
pub const JWT_SECRET_VAR: &str = "GREENLENS_JWT_SECRET";

/// GreenLens configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub image: ImageConfig,
    pub crisis: CrisisConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub database_path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisConfig {
    /// Year headings requested from the provider, in document order
    pub years: Vec<String>,
    /// Minimum words per scenario section
    pub min_words: u32,
    /// Fail the request when the parsed years differ from `years`
    pub strict_years: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub leeway_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            database_path: None,
            max_connections: 5,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for CrisisConfig {
    fn default() -> Self {
        Self {
            years: vec!["2030".to_string(), "2050".to_string(), "2100".to_string()],
            min_words: 120,
            strict_years: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            leeway_secs: 30,
        }
    }
}

/// Read a secret from the environment; blank values count as unset
fn env_secret(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Redact a secret for display, keeping the last four characters
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        "***".to_string()
    } else {
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("***{}", suffix)
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        env_secret(LLM_API_KEY_VAR)
    }
}

impl ImageConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        env_secret(IMAGE_API_KEY_VAR)
    }
}

impl AuthConfig {
    pub fn resolved_secret(&self) -> Option<String> {
        env_secret(JWT_SECRET_VAR)
    }
}

/// Check that a year label is the 4-character token the parser extracts
fn validate_year(year: &str) -> anyhow::Result<()> {
    if year.chars().count() != 4 || year.chars().any(char::is_whitespace) {
        return Err(anyhow!(
            "Invalid year label '{}': must be exactly 4 non-whitespace characters",
            year
        ));
    }
    Ok(())
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("GREENLENS_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("greenlens")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or use defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.crisis.years.is_empty() {
            return Err(anyhow!("crisis.years must list at least one year"));
        }
        for year in &self.crisis.years {
            validate_year(year)?;
        }
        if ImageSize::parse(&self.image.size).is_none() {
            return Err(anyhow!(
                "Invalid image.size '{}': expected WIDTHxHEIGHT",
                self.image.size
            ));
        }
        Ok(())
    }

    /// Resolve the database path, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        self.server
            .database_path
            .clone()
            .unwrap_or_else(crate::storage::database::default_database_path)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Server settings
            "server.bind" => Ok(self.server.bind.clone()),
            "server.database_path" => Ok(self.database_path().display().to_string()),
            "server.max_connections" => Ok(self.server.max_connections.to_string()),

            // LLM settings
            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.model" => Ok(self.llm.model.clone()),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.max_tokens" => Ok(self.llm.max_tokens.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),

            // Image settings
            "image.base_url" => Ok(self.image.base_url.clone()),
            "image.model" => Ok(self.image.model.clone()),
            "image.size" => Ok(self.image.size.clone()),
            "image.timeout_secs" => Ok(self.image.timeout_secs.to_string()),

            // Crisis settings
            "crisis.years" => Ok(self.crisis.years.join(", ")),
            "crisis.min_words" => Ok(self.crisis.min_words.to_string()),
            "crisis.strict_years" => Ok(self.crisis.strict_years.to_string()),

            "auth.leeway_secs" => Ok(self.auth.leeway_secs.to_string()),

            // Secrets (special handling - show redacted)
            "llm.api_key" => Ok(match self.llm.resolved_api_key() {
                Some(key) => redact(&key),
                None => format!("(not set - use {} env var)", LLM_API_KEY_VAR),
            }),
            "image.api_key" => Ok(match self.image.resolved_api_key() {
                Some(key) => redact(&key),
                None => format!("(not set - use {} env var)", IMAGE_API_KEY_VAR),
            }),
            "auth.secret" => Ok(match self.auth.resolved_secret() {
                Some(secret) => redact(&secret),
                None => format!("(not set - use {} env var)", JWT_SECRET_VAR),
            }),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `greenlens config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "server.bind" => {
                value
                    .parse::<std::net::SocketAddr>()
                    .with_context(|| format!("Invalid bind address: {}", value))?;
                self.server.bind = value.to_string();
            }
            "server.database_path" => {
                self.server.database_path = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "server.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.server.max_connections = max;
            }

            "llm.base_url" => {
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }
            "llm.model" => {
                self.llm.model = value.to_string();
            }
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.max_tokens" => {
                self.llm.max_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }

            "image.base_url" => {
                self.image.base_url = value.trim_end_matches('/').to_string();
            }
            "image.model" => {
                self.image.model = value.to_string();
            }
            "image.size" => {
                if ImageSize::parse(value).is_none() {
                    return Err(anyhow!("Invalid image size: {}. Expected WIDTHxHEIGHT", value));
                }
                self.image.size = value.to_string();
            }
            "image.timeout_secs" => {
                self.image.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }

            "crisis.years" => {
                let years: Vec<String> = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if years.is_empty() {
                    return Err(anyhow!("crisis.years must list at least one year"));
                }
                for year in &years {
                    validate_year(year)?;
                }
                self.crisis.years = years;
            }
            "crisis.min_words" => {
                self.crisis.min_words = value
                    .parse()
                    .with_context(|| format!("Invalid min_words value: {}", value))?;
            }
            "crisis.strict_years" => {
                self.crisis.strict_years = value
                    .parse()
                    .with_context(|| format!("Invalid strict_years value: {} (use true/false)", value))?;
            }

            "auth.leeway_secs" => {
                self.auth.leeway_secs = value
                    .parse()
                    .with_context(|| format!("Invalid leeway_secs value: {}", value))?;
            }

            "llm.api_key" | "image.api_key" | "auth.secret" => {
                return Err(anyhow!(
                    "Secrets cannot be stored in configuration. Set {}, {} or {} in the environment instead.",
                    LLM_API_KEY_VAR,
                    IMAGE_API_KEY_VAR,
                    JWT_SECRET_VAR
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `greenlens config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "server.bind",
            "server.database_path",
            "server.max_connections",
            "llm.base_url",
            "llm.model",
            "llm.temperature",
            "llm.max_tokens",
            "llm.timeout_secs",
            "llm.api_key",
            "image.base_url",
            "image.model",
            "image.size",
            "image.timeout_secs",
            "image.api_key",
            "crisis.years",
            "crisis.min_words",
            "crisis.strict_years",
            "auth.leeway_secs",
            "auth.secret",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
