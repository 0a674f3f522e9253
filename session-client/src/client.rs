//! Client-side session manager
//!
//! Wraps `reqwest` with the session plumbing the QRPass API expects:
//! - a cached CSRF token, fetched once and attached as `X-XSRF-TOKEN` on
//!   every state-changing call (the matching cookie rides in the jar)
//! - bearer-token handling with exactly one refresh-and-replay cycle when
//!   the server reports an expired access token; a failed refresh or a
//!   second 401 terminates the session instead of looping
//!
//! UI layers consume the `ClientError` taxonomy; only `NetworkUnreachable`
//! and `RateLimited` are worth retrying from the outside.

use crate::error::{ClientError, ClientResult};
use error_common::codes;
use reqwest::{header, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

const CSRF_HEADER: &str = "X-XSRF-TOKEN";

const LOGIN_PATH: &str = "/api/v1/auth/login";
const LOGOUT_PATH: &str = "/api/v1/auth/logout";
const REFRESH_PATH: &str = "/api/v1/auth/refresh";
const CSRF_PATH: &str = "/api/v1/auth/csrf";
const ME_PATH: &str = "/api/v1/auth/me";

/// Session client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Tokens held for the active session
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds, as reported by the server
    pub expires_in: i64,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub subject_id: String,
    pub role: String,
    pub expires_in: i64,
}

/// Identity of the authenticated subject
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub subject_id: String,
    pub role: String,
}

/// Success envelope used by every API response
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    subject_id: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct RefreshData {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct CsrfData {
    csrf_token: String,
}

/// Error envelope; tolerant of missing fields so any body classifies
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    code: Option<String>,
}

/// Session manager over the QRPass API
pub struct SessionClient {
    config: ClientConfig,
    http: reqwest::Client,
    tokens: RwLock<Option<SessionTokens>>,
    csrf: RwLock<Option<String>>,
}

fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::NetworkUnreachable(err.to_string())
}

fn requires_csrf(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD && *method != Method::OPTIONS
}

/// Map a non-success response to the client error taxonomy
async fn classify(response: Response) -> ClientError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    let payload: ErrorPayload = response.json().await.unwrap_or_default();
    let message = payload
        .message
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    match status.as_u16() {
        401 if payload.code.as_deref() == Some(codes::authentication::TOKEN_EXPIRED) => {
            ClientError::TokenExpired
        }
        403 => ClientError::Forbidden(message),
        429 => ClientError::RateLimited {
            retry_after_seconds: retry_after,
        },
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

impl SessionClient {
    /// Create a client against the given server
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            tokens: RwLock::new(None),
            csrf: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Current session tokens, for persistence across restarts
    pub async fn session(&self) -> Option<SessionTokens> {
        self.tokens.read().await.clone()
    }

    /// Restore a previously persisted session
    pub async fn restore_session(&self, tokens: SessionTokens) {
        *self.tokens.write().await = Some(tokens);
    }

    /// Fetch-or-reuse the CSRF token for state-changing calls
    async fn ensure_csrf(&self) -> ClientResult<String> {
        if let Some(token) = self.csrf.read().await.clone() {
            return Ok(token);
        }

        let response = self
            .http
            .get(self.url(CSRF_PATH))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify(response).await);
        }

        let envelope: Envelope<CsrfData> = response
            .json()
            .await
            .map_err(|e| ClientError::Internal(format!("Malformed CSRF response: {e}")))?;

        let token = envelope.data.csrf_token;
        *self.csrf.write().await = Some(token.clone());
        Ok(token)
    }

    /// Drop session state and report termination
    async fn terminate(&self) -> ClientError {
        self.tokens.write().await.take();
        tracing::warn!("Session terminated");
        ClientError::SessionTerminated
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// Any server-side rejection terminates the session; transport failures
    /// are reported as transient without touching the stored tokens.
    async fn refresh(&self) -> ClientResult<()> {
        let refresh_token = match self.tokens.read().await.as_ref() {
            Some(tokens) => tokens.refresh_token.clone(),
            None => return Err(ClientError::SessionTerminated),
        };

        let csrf = self.ensure_csrf().await?;
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .header(CSRF_HEADER, csrf)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.terminate().await);
        }

        let envelope: Envelope<RefreshData> = response
            .json()
            .await
            .map_err(|e| ClientError::Internal(format!("Malformed refresh response: {e}")))?;

        if let Some(tokens) = self.tokens.write().await.as_mut() {
            tokens.access_token = envelope.data.access_token;
            tokens.expires_in = envelope.data.expires_in;
        }

        tracing::debug!("Access token refreshed");
        Ok(())
    }

    /// Send an API request with CSRF and bearer handling
    ///
    /// Performs at most one refresh-and-replay cycle on an expired access
    /// token. A second 401 on the replay terminates the session.
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Response> {
        let mut refreshed = false;
        loop {
            let mut builder = self.http.request(method.clone(), self.url(path));

            if requires_csrf(&method) {
                builder = builder.header(CSRF_HEADER, self.ensure_csrf().await?);
            }
            if let Some(tokens) = self.tokens.read().await.as_ref() {
                builder = builder.bearer_auth(&tokens.access_token);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(transport_error)?;
            if response.status().is_success() {
                return Ok(response);
            }

            match classify(response).await {
                ClientError::TokenExpired if !refreshed => {
                    if self.tokens.read().await.is_none() {
                        return Err(ClientError::TokenExpired);
                    }
                    refreshed = true;
                    self.refresh().await?;
                }
                ClientError::TokenExpired => return Err(self.terminate().await),
                ClientError::Api { status: 401, .. } if refreshed => {
                    return Err(self.terminate().await)
                }
                other => return Err(other),
            }
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| ClientError::Internal(format!("Malformed response body: {e}")))
    }

    /// Authenticated GET returning the response `data` payload
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.request(Method::GET, path, None).await?;
        Self::parse(response).await
    }

    /// Authenticated POST returning the response `data` payload
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| ClientError::Internal(format!("Failed to encode request body: {e}")))?;
        let response = self.request(Method::POST, path, Some(&body)).await?;
        Self::parse(response).await
    }

    /// Sign in and store the issued token pair
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<SessionInfo> {
        let csrf = self.ensure_csrf().await?;
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .header(CSRF_HEADER, csrf)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify(response).await);
        }

        let data: LoginData = Self::parse(response).await?;
        *self.tokens.write().await = Some(SessionTokens {
            access_token: data.access_token,
            refresh_token: data.refresh_token,
            expires_in: data.expires_in,
        });

        tracing::info!(subject = %data.subject_id, "Signed in");
        Ok(SessionInfo {
            subject_id: data.subject_id,
            role: data.role,
            expires_in: data.expires_in,
        })
    }

    /// Revoke the refresh token and drop local session state
    ///
    /// Local state is cleared even when the server call fails; the refresh
    /// token then simply ages out server-side.
    pub async fn logout(&self) -> ClientResult<()> {
        let Some(tokens) = self.tokens.write().await.take() else {
            return Ok(());
        };

        let csrf = self.ensure_csrf().await?;
        let response = self
            .http
            .post(self.url(LOGOUT_PATH))
            .header(CSRF_HEADER, csrf)
            .bearer_auth(&tokens.access_token)
            .json(&json!({ "refresh_token": tokens.refresh_token }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify(response).await);
        }
        Ok(())
    }

    /// Fetch the identity behind the current session
    pub async fn me(&self) -> ClientResult<AccountInfo> {
        self.get_json(ME_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_required_on_mutations_only() {
        assert!(requires_csrf(&Method::POST));
        assert!(requires_csrf(&Method::PUT));
        assert!(requires_csrf(&Method::DELETE));
        assert!(!requires_csrf(&Method::GET));
        assert!(!requires_csrf(&Method::HEAD));
        assert!(!requires_csrf(&Method::OPTIONS));
    }

    #[test]
    fn test_url_joining_handles_trailing_slash() {
        let client = SessionClient::new(ClientConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(client.url("/api/v1/health"), "http://localhost:9000/api/v1/health");
    }

    #[tokio::test]
    async fn test_session_restore_round_trip() {
        let client = SessionClient::new(ClientConfig::default()).unwrap();
        assert!(client.session().await.is_none());

        client
            .restore_session(SessionTokens {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
                expires_in: 900,
            })
            .await;

        let tokens = client.session().await.unwrap();
        assert_eq!(tokens.access_token, "a");
        assert_eq!(tokens.refresh_token, "r");
    }
}
