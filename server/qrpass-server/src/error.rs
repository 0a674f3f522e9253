//! API error types and structured JSON error responses
//!
//! Every failure the middleware or handlers can produce is recovered here and
//! rendered as `{ "success": false, "message": ... }` with a machine-readable
//! code, so no condition ever propagates as an unhandled panic to the client.

use auth_tokens::TokenError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use error_common::codes;
use serde::Serialize;
use thiserror::Error;

/// One field-level validation violation
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// API error taxonomy
///
/// Each variant maps to exactly one HTTP status code and error code, per the
/// external interface contract.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 - missing, malformed, or otherwise unacceptable credentials
    #[error("{0}")]
    Authentication(String),

    /// 401 - structurally valid access token past its expiry
    #[error("Token expired")]
    TokenExpired,

    /// 401 - refresh token unknown, expired, or revoked
    #[error("{0}")]
    RefreshInvalid(String),

    /// 403 - double-submit cookie/header mismatch
    #[error("{0}")]
    CsrfMismatch(String),

    /// 403 - Origin header outside the configured allowlist
    #[error("{0}")]
    OriginNotAllowed(String),

    /// 403 - SQLi/path-traversal pattern match
    #[error("{0}")]
    SuspiciousInput(String),

    /// 400 - malformed request outside field-level validation
    #[error("{0}")]
    BadRequest(String),

    /// 400 - one or more field-level validation violations
    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    /// 413 - request body above the configured limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// 423 - failed-login threshold exceeded within the window
    #[error("{0}")]
    AccountLocked(String),

    /// 429 - with a caller-visible retry-after hint
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_seconds: u64,
    },

    /// 500 - anything that should never reach the client in detail
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn csrf(message: impl Into<String>) -> Self {
        Self::CsrfMismatch(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn rate_limit(message: impl Into<String>, retry_after_seconds: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_seconds,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(_) | Self::TokenExpired | Self::RefreshInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::CsrfMismatch(_) | Self::OriginNotAllowed(_) | Self::SuspiciousInput(_) => {
                StatusCode::FORBIDDEN
            }
            Self::BadRequest(_) | Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AccountLocked(_) => StatusCode::LOCKED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for client-side dispatch
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => codes::authentication::TOKEN_INVALID,
            Self::TokenExpired => codes::authentication::TOKEN_EXPIRED,
            Self::RefreshInvalid(_) => codes::authentication::REFRESH_INVALID,
            Self::CsrfMismatch(_) => codes::csrf::TOKEN_MISMATCH,
            Self::OriginNotAllowed(_) => codes::csrf::ORIGIN_NOT_ALLOWED,
            Self::SuspiciousInput(_) => codes::validation::SUSPICIOUS_INPUT,
            Self::BadRequest(_) | Self::ValidationFailed(_) => codes::validation::INVALID_INPUT,
            Self::PayloadTooLarge(_) => codes::transport::PAYLOAD_TOO_LARGE,
            Self::AccountLocked(_) => codes::authentication::ACCOUNT_LOCKED,
            Self::RateLimited { .. } => codes::transport::RATE_LIMITED,
            Self::Internal(_) => "INTERNAL_5000",
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::TokenExpired => Self::TokenExpired,
            TokenError::TokenInvalid | TokenError::WrongKind => {
                Self::Authentication("Invalid token".to_string())
            }
            TokenError::RefreshInvalid => Self::RefreshInvalid("Invalid refresh token".to_string()),
            TokenError::JwtError(_) | TokenError::InternalError(_) => {
                Self::Internal("Token processing failed".to_string())
            }
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(code = code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = code, status = %status, "Request rejected: {}", self);
        }

        let errors = match &self {
            Self::ValidationFailed(errors) => Some(errors.clone()),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            code,
            errors,
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimited {
            retry_after_seconds,
            ..
        } = self
        {
            if let Ok(value) = header::HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

/// Envelope for successful API responses
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap a payload in the success envelope
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::csrf("mismatch").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::AccountLocked("locked".into()).status(),
            StatusCode::LOCKED
        );
        assert_eq!(
            ApiError::PayloadTooLarge("too big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::rate_limit("slow down", 30).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_token_error_conversion() {
        assert!(matches!(
            ApiError::from(TokenError::TokenExpired),
            ApiError::TokenExpired
        ));
        assert!(matches!(
            ApiError::from(TokenError::WrongKind),
            ApiError::Authentication(_)
        ));
        assert!(matches!(
            ApiError::from(TokenError::RefreshInvalid),
            ApiError::RefreshInvalid(_)
        ));
    }

    #[test]
    fn test_validation_errors_serialized() {
        let err = ApiError::ValidationFailed(vec![
            FieldError::new("email", "Email is required"),
            FieldError::new("password", "Password is required"),
        ]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
