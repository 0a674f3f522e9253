//! Authentication context extraction
//!
//! Extracts and validates the bearer token on protected routes, so handlers
//! receive an `AuthContext` instead of parsing Authorization headers
//! themselves. Refresh tokens are rejected here; only access tokens
//! authorize requests.

use crate::error::ApiError;
use crate::middleware::RequestContext;
use async_trait::async_trait;
use auth_tokens::{TokenClaims, TokenService};
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::sync::Arc;

/// Authentication context extracted from a validated access token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject_id: String,
    pub role: String,
    pub claims: TokenClaims,
    /// Request context (automatically extracted)
    pub request: RequestContext,
}

impl AuthContext {
    /// Get request ID (convenience method)
    pub fn request_id(&self) -> &str {
        &self.request.request_id
    }
}

/// Extract the bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Result<String, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            ApiError::authentication("Invalid Authorization header format. Expected: Bearer <token>")
        })
        .map(|s| s.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract RequestContext first so rejections still carry a request ID
        let request = RequestContext::from_request_parts(parts, state).await?;

        let tokens = parts
            .extensions
            .get::<Arc<TokenService>>()
            .cloned()
            .ok_or_else(|| ApiError::internal("Token service not configured"))?;

        let token = extract_token(parts)?;
        let claims = tokens.validate_access(&token)?;

        tracing::debug!(
            request_id = %request.request_id,
            subject = %claims.sub,
            "Bearer token validated"
        );

        Ok(AuthContext {
            subject_id: claims.sub.clone(),
            role: claims.role.clone(),
            claims,
            request,
        })
    }
}
