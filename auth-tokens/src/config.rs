use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            issuer: "qrpass".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
        }
    }
}

impl TokenConfig {
    /// Load configuration from environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            jwt_secret: std::env::var("QRPASS_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            issuer: std::env::var("QRPASS_JWT_ISSUER").unwrap_or(defaults.issuer),
            access_token_ttl_minutes: std::env::var("QRPASS_ACCESS_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.access_token_ttl_minutes),
            refresh_token_ttl_days: std::env::var("QRPASS_REFRESH_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_token_ttl_days),
        }
    }
}
