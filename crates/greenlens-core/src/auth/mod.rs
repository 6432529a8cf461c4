//! Bearer-token authentication
//!
//! Tokens are issued elsewhere; GreenLens only validates them. The
//! `Authenticator` trait is the seam the HTTP layer calls through, and
//! `JwtAuthenticator` is the HS256 implementation used in production.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AuthConfig, JWT_SECRET_VAR};
use crate::error::{Error, Result};

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Token claims: `sub` is the username, `id` the numeric user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub id: i64,
    pub exp: u64,
}

/// Resolves a bearer token to a user
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<User>;
}

/// HS256 token validator
pub struct JwtAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("algorithm", &"HS256")
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl JwtAuthenticator {
    /// Create an authenticator for the given shared secret
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Allowed clock skew when checking `exp`
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.validation.leeway = secs;
        self
    }

    /// Build from configuration, reading the secret from the environment
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config
            .resolved_secret()
            .ok_or_else(|| {
                Error::ConfigError(format!("{} is not set", JWT_SECRET_VAR))
            })?;
        Ok(Self::new(&secret).with_leeway(config.leeway_secs))
    }

    /// Validate a token and return its claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            Error::Unauthorized(e.to_string())
        })?;
        Ok(data.claims)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.decode_claims(token)?;
        if claims.sub.trim().is_empty() {
            return Err(Error::Unauthorized("token has an empty subject".to_string()));
        }
        Ok(User::new(claims.id, claims.sub))
    }
}
