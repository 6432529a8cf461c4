//! HTTP error responses
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}` with a
//! status derived from the error kind.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::error::Error;

/// Wrapper that turns a crate error into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to a client
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::BAD_GATEWAY => "Upstream AI provider request failed".to_string(),
            _ => self.0.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "Request failed");
        } else {
            warn!(code = self.0.code(), error = %self.0, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": self.0.code(),
                "message": self.public_message(),
            }
        }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
