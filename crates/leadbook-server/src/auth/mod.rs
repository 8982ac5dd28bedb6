//! Bearer-token authentication
//!
//! [`require_auth`] guards every business route. It reads
//! `Authorization: Bearer <token>`, asks the configured [`IdentityVerifier`]
//! for the caller, and stores the resulting [`Principal`] in the request
//! extensions for handlers to pick up with `Extension<Principal>`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use leadbook_common::Actor;
use serde::Serialize;
use thiserror::Error;

use crate::error::AppError;

pub mod clerk;

pub use clerk::ClerkVerifier;

pub const MISSING_HEADER_MESSAGE: &str = "Missing Authorization header";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Principal {
    pub fn actor(&self) -> Actor {
        Actor::user(self.id.clone())
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("token rejected: {0}")]
    InvalidToken(String),

    #[error("identity lookup failed: {0}")]
    Lookup(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingHeader => AppError::Unauthorized(MISSING_HEADER_MESSAGE.to_string()),
            other => {
                tracing::debug!(reason = %other, "Authentication failed");
                AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
            },
        }
    }
}

/// Turns a session token into a [`Principal`].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Pulls the token out of an `Authorization` header value. A `Bearer `
/// prefix is optional.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

/// Axum middleware rejecting unauthenticated requests with 401.
pub async fn require_auth(
    State(verifier): State<Arc<dyn IdentityVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| AuthError::InvalidToken("malformed Authorization header".to_string()))?;

    let principal = verifier.verify(token).await?;
    tracing::debug!(user_id = %principal.id, "Request authenticated");

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
