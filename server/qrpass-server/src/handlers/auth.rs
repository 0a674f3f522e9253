//! Authentication handlers: login, refresh, logout, CSRF token issuance
//!
//! The login route owns the lockout policy: once the failed-login count for
//! an identifier reaches the configured threshold, further attempts are
//! answered with 423 until the tracking window expires or the counter is
//! reset by a successful login.

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::{csrf, AuthContext};
use crate::server::QrPassServer;
use crate::validation::{CharClass, FieldValidator, RequestValidation, Rule};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address used as the login identifier
    pub email: String,
    /// User password
    pub password: String,
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldValidator::new()
            .field("email", Some(&self.email), &[Rule::Required, Rule::Email])
            .field(
                "password",
                Some(&self.password),
                &[
                    Rule::Required,
                    Rule::MinLen(8),
                    Rule::CharClass(CharClass::Uppercase),
                    Rule::CharClass(CharClass::Lowercase),
                    Rule::CharClass(CharClass::Digit),
                ],
            )
            .finish()
    }
}

/// Authentication response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// JWT access token
    pub access_token: String,
    /// Refresh token for minting new access tokens
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Authenticated subject ID
    pub subject_id: String,
    /// Platform role
    pub role: String,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// Logout request
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// CSRF token response
#[derive(Debug, Serialize)]
pub struct CsrfResponse {
    pub csrf_token: String,
}

/// Identity response for the protected `me` route
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject_id: String,
    pub role: String,
}

/// User login handler
pub async fn login(
    State(server): State<QrPassServer>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    request.validate()?;

    // Locked identifiers are rejected before credentials are even checked,
    // so the lockout cannot be probed for valid passwords
    let count = server.attempts.get_count(&request.email).await;
    if count >= server.config.lockout_threshold {
        tracing::warn!(identifier = %request.email, count = count, "Login attempt while locked");
        return Err(ApiError::AccountLocked(
            "Account temporarily locked after repeated failed logins".to_string(),
        ));
    }

    match server.verifier.verify(&request.email, &request.password).await? {
        Some(subject) => {
            server.attempts.reset(&request.email).await;
            let pair = server.tokens.issue(&subject.id, &subject.role).await?;

            tracing::info!(subject = %subject.id, role = %subject.role, "Login succeeded");

            Ok(Json(api_success(AuthResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                expires_in: pair.expires_in,
                subject_id: subject.id,
                role: subject.role,
            })))
        }
        None => {
            let count = server.attempts.record_failure(&request.email).await;
            tracing::warn!(identifier = %request.email, count = count, "Login failed");
            Err(ApiError::authentication("Invalid email or password"))
        }
    }
}

/// Token refresh handler
///
/// Mints exactly one new access token per call; the refresh token itself is
/// left untouched until logout or expiry.
pub async fn refresh(
    State(server): State<QrPassServer>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    if request.refresh_token.trim().is_empty() {
        return Err(ApiError::validation("Refresh token is required"));
    }

    let access_token = server.tokens.refresh(&request.refresh_token).await?;

    Ok(Json(api_success(RefreshResponse {
        access_token,
        expires_in: server.tokens.access_ttl_seconds(),
    })))
}

/// User logout handler
///
/// Revokes the refresh token; the access token simply ages out.
pub async fn logout(
    State(server): State<QrPassServer>,
    Json(request): Json<LogoutRequest>,
) -> Result<StatusCode, ApiError> {
    if request.refresh_token.trim().is_empty() {
        return Err(ApiError::validation("Refresh token is required"));
    }

    server.tokens.revoke(&request.refresh_token).await;
    Ok(StatusCode::NO_CONTENT)
}

/// CSRF token issuance handler
///
/// Issues a fresh token in both the response body and the `XSRF-TOKEN`
/// cookie so the client can complete the double-submit pair.
pub async fn csrf_token(State(server): State<QrPassServer>) -> Result<Response, ApiError> {
    let token = csrf::issue_token();
    let cookie = csrf::cookie_for(&token, server.config.production);

    let mut response = Json(api_success(CsrfResponse { csrf_token: token })).into_response();

    let value = header::HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::internal("Failed to encode CSRF cookie"))?;
    response.headers_mut().insert(header::SET_COOKIE, value);

    Ok(response)
}

/// Protected identity handler, exercises the bearer-token path
pub async fn me(auth: AuthContext) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    Ok(Json(api_success(MeResponse {
        subject_id: auth.subject_id,
        role: auth.role,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_login_request_validation_collects_all() {
        let request = LoginRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        match request.validate() {
            Err(ApiError::ValidationFailed(errors)) => {
                // bad email + too short + missing uppercase + missing digit
                assert_eq!(errors.len(), 4);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_login_request_valid() {
        let request = LoginRequest {
            email: "student@example.com".to_string(),
            password: "Str0ngpass".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_one_error_each() {
        let request = LoginRequest {
            email: String::new(),
            password: String::new(),
        };
        match request.validate() {
            Err(ApiError::ValidationFailed(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert!(fields.contains(&"email"));
                assert!(fields.contains(&"password"));
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
