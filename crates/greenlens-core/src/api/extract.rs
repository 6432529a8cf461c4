//! Request extractors

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::User;
use crate::error::Error;

use super::AppState;
use super::error::ApiError;

/// The caller identified by `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| Error::Unauthorized("missing or malformed bearer token".to_string()))?;
        let user = state.authenticator.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

/// Token from an `Authorization: Bearer` header; the scheme is case-insensitive
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
