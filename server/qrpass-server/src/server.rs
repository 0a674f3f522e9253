use crate::attempts::{AttemptStore, InMemoryAttemptStore};
use crate::error::ApiError;
use crate::middleware::rate_limit::RateLimiter;
use anyhow::Result;
use async_trait::async_trait;
use auth_tokens::{InMemoryRefreshTokenStore, TokenConfig, TokenService};
use error_common::QrPassError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Main QRPass server state
#[derive(Clone)]
pub struct QrPassServer {
    /// Server configuration
    pub config: ServerConfig,
    /// Token issuance and validation service
    pub tokens: Arc<TokenService>,
    /// Failed-login attempt store
    pub attempts: Arc<dyn AttemptStore>,
    /// Credential verification backend
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Per-client request rate limiter
    pub limiter: Arc<RateLimiter>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name
    pub name: String,
    /// Production mode: enables the Secure cookie flag
    pub production: bool,
    /// Hosts accepted on cross-site requests; an empty list disables
    /// origin screening
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
    /// Failed logins within the window before the account locks
    pub lockout_threshold: u32,
    /// Requests accepted per client per minute
    pub rate_limit_per_minute: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "QRPass Engine".to_string(),
            production: false,
            allowed_origins: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            max_body_bytes: 64 * 1024,
            lockout_threshold: 5,
            rate_limit_per_minute: 300,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: defaults.name,
            production: std::env::var("QRPASS_PRODUCTION")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.production),
            allowed_origins: std::env::var("QRPASS_ALLOWED_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.allowed_origins),
            max_body_bytes: std::env::var("QRPASS_MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            lockout_threshold: std::env::var("QRPASS_LOCKOUT_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lockout_threshold),
            rate_limit_per_minute: std::env::var("QRPASS_RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_per_minute),
        }
    }
}

/// Authenticated subject as reported by the credential backend
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: String,
    pub role: String,
}

/// Credential verification seam
///
/// The platform's user directory is a collaborator, not part of this
/// subsystem; handlers only see verified subjects through this trait.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `Ok(None)` means the credentials do not match any subject
    async fn verify(&self, identifier: &str, password: &str)
        -> Result<Option<Subject>, ApiError>;
}

struct StaticUser {
    id: String,
    role: String,
    password_hash: String,
}

/// Fixed credential table for demos and tests
///
/// Stores SHA-256 password hashes, never plaintext. Production deployments
/// implement `CredentialVerifier` against the platform user directory.
#[derive(Default)]
pub struct StaticCredentialVerifier {
    users: HashMap<String, StaticUser>,
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl StaticCredentialVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, identifier: &str, password: &str, role: &str) -> Self {
        self.users.insert(
            identifier.to_string(),
            StaticUser {
                id: uuid::Uuid::new_v4().to_string(),
                role: role.to_string(),
                password_hash: hash_password(password),
            },
        );
        self
    }

    /// Seed from `QRPASS_ADMIN_EMAIL`/`QRPASS_ADMIN_PASSWORD` when present
    pub fn from_env() -> Self {
        let mut verifier = Self::new();
        if let (Ok(email), Ok(password)) = (
            std::env::var("QRPASS_ADMIN_EMAIL"),
            std::env::var("QRPASS_ADMIN_PASSWORD"),
        ) {
            verifier = verifier.with_user(&email, &password, "admin");
        }
        verifier
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Option<Subject>, ApiError> {
        match self.users.get(identifier) {
            Some(user) if user.password_hash == hash_password(password) => Ok(Some(Subject {
                id: user.id.clone(),
                role: user.role.clone(),
            })),
            _ => Ok(None),
        }
    }
}

impl QrPassServer {
    /// Create a server instance from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = ServerConfig::from_env();
        let token_config = TokenConfig::from_env();

        // Refuse to start a production instance on the default signing key
        if config.production && token_config.jwt_secret == TokenConfig::default().jwt_secret {
            return Err(QrPassError::ConfigError(
                "QRPASS_JWT_SECRET must be set when QRPASS_PRODUCTION is enabled".to_string(),
            )
            .into());
        }

        let tokens = Arc::new(TokenService::new(
            token_config,
            Arc::new(InMemoryRefreshTokenStore::new()),
        ));
        let attempts: Arc<dyn AttemptStore> = Arc::new(InMemoryAttemptStore::new());
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(StaticCredentialVerifier::from_env());
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute));

        Ok(Self {
            config,
            tokens,
            attempts,
            verifier,
            limiter,
        })
    }

    /// Create a server instance with explicit collaborators
    ///
    /// This is the constructor tests use.
    pub fn new(
        config: ServerConfig,
        tokens: Arc<TokenService>,
        attempts: Arc<dyn AttemptStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute));
        Self {
            config,
            tokens,
            attempts,
            verifier,
            limiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_verifier_accepts_correct_password() {
        let verifier =
            StaticCredentialVerifier::new().with_user("user@example.com", "Str0ng!pass", "student");

        let subject = verifier
            .verify("user@example.com", "Str0ng!pass")
            .await
            .unwrap();
        assert_eq!(subject.unwrap().role, "student");
    }

    #[tokio::test]
    async fn test_static_verifier_rejects_wrong_password() {
        let verifier =
            StaticCredentialVerifier::new().with_user("user@example.com", "Str0ng!pass", "student");

        assert!(verifier
            .verify("user@example.com", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(verifier
            .verify("other@example.com", "Str0ng!pass")
            .await
            .unwrap()
            .is_none());
    }
}
