use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which half of the token pair a JWT represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT token claims structure
///
/// Standard JWT claims plus the custom claims the attendance platform needs
/// to authorize a request without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// JWT ID (unique token identifier)
    pub jti: String,

    /// Platform role (student, lecturer, admin)
    pub role: String,

    /// Issued at timestamp (seconds since epoch)
    pub iat: i64,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Access or refresh token
    pub kind: TokenKind,
}

impl TokenClaims {
    /// Create new claims for a token of the given kind
    pub fn new(
        subject_id: &str,
        role: &str,
        issuer: &str,
        kind: TokenKind,
        ttl_seconds: i64,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + ttl_seconds,
            iss: issuer.to_string(),
            kind,
        }
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

/// Access/refresh token pair returned at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds, for client-side scheduling
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_claims_not_expired() {
        let claims = TokenClaims::new("user-1", "student", "qrpass", TokenKind::Access, 300);
        assert!(!claims.is_expired());
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let claims = TokenClaims::new("user-1", "student", "qrpass", TokenKind::Access, 0);
        assert!(claims.is_expired());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let claims = TokenClaims::new("user-1", "admin", "qrpass", TokenKind::Refresh, 60);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["kind"], "refresh");
    }
}
