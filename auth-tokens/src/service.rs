use crate::claims::{TokenClaims, TokenKind, TokenPair};
use crate::config::TokenConfig;
use crate::error::{Result, TokenError};
use crate::store::{hash_token, RefreshTokenStore};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

/// Token service
///
/// Handles issuance and validation of the access/refresh token pair. Access
/// tokens are self-contained JWTs; refresh tokens are JWTs additionally
/// tracked by hash in the injected store so logout can revoke them before
/// their natural expiry.
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    store: Arc<dyn RefreshTokenStore>,
}

impl TokenService {
    /// Create new token service
    pub fn new(config: TokenConfig, store: Arc<dyn RefreshTokenStore>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
            store,
        }
    }

    /// Issue an access/refresh token pair for an authenticated subject
    pub async fn issue(&self, subject_id: &str, role: &str) -> Result<TokenPair> {
        let access_ttl = self.config.access_token_ttl_minutes * 60;
        let refresh_ttl = self.config.refresh_token_ttl_days * 24 * 60 * 60;

        let access_claims = TokenClaims::new(
            subject_id,
            role,
            &self.config.issuer,
            TokenKind::Access,
            access_ttl,
        );
        let refresh_claims = TokenClaims::new(
            subject_id,
            role,
            &self.config.issuer,
            TokenKind::Refresh,
            refresh_ttl,
        );

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access_claims, &self.encoding_key)?;
        let refresh_token = encode(&header, &refresh_claims, &self.encoding_key)?;

        // Track the refresh token so logout can revoke it
        let expires_at = Utc::now() + Duration::seconds(refresh_ttl);
        self.store
            .insert(&hash_token(&refresh_token), expires_at)
            .await;

        tracing::debug!(subject = subject_id, role = role, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: access_ttl,
        })
    }

    /// Validate and decode a token of either kind
    ///
    /// Checks structural well-formedness (three dot-separated segments)
    /// before attempting signature and expiry verification, so obviously
    /// malformed input fails fast as `TokenInvalid`.
    pub fn validate(&self, token: &str) -> Result<TokenClaims> {
        if token.split('.').count() != 3 {
            return Err(TokenError::TokenInvalid);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Validate a bearer token for a protected route
    ///
    /// A refresh token is never accepted where an access token is required.
    pub fn validate_access(&self, token: &str) -> Result<TokenClaims> {
        let claims = self.validate(token)?;
        if claims.kind != TokenKind::Access {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }

    /// Exchange a refresh token for exactly one new access token
    ///
    /// Any failure mode (malformed, expired, unknown, revoked, wrong kind)
    /// collapses to `RefreshInvalid`; the caller cannot distinguish a revoked
    /// token from one that never existed.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self
            .validate(refresh_token)
            .map_err(|_| TokenError::RefreshInvalid)?;

        if claims.kind != TokenKind::Refresh {
            return Err(TokenError::RefreshInvalid);
        }

        if !self.store.contains(&hash_token(refresh_token)).await {
            tracing::warn!(subject = %claims.sub, "Refresh attempt with unknown or revoked token");
            return Err(TokenError::RefreshInvalid);
        }

        let access_claims = TokenClaims::new(
            &claims.sub,
            &claims.role,
            &self.config.issuer,
            TokenKind::Access,
            self.config.access_token_ttl_minutes * 60,
        );
        let token = encode(
            &Header::new(Algorithm::HS256),
            &access_claims,
            &self.encoding_key,
        )?;

        tracing::debug!(subject = %claims.sub, "Minted access token from refresh token");
        Ok(token)
    }

    /// Revoke a refresh token (logout)
    pub async fn revoke(&self, refresh_token: &str) {
        self.store.remove(&hash_token(refresh_token)).await;
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_seconds(&self) -> i64 {
        self.config.access_token_ttl_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRefreshTokenStore;

    fn service_with_ttl(access_minutes: i64) -> TokenService {
        let config = TokenConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: "qrpass-test".to_string(),
            access_token_ttl_minutes: access_minutes,
            refresh_token_ttl_days: 7,
        };
        TokenService::new(config, Arc::new(InMemoryRefreshTokenStore::new()))
    }

    #[tokio::test]
    async fn test_issue_and_validate_roundtrip() {
        let service = service_with_ttl(15);
        let pair = service.issue("user-1", "student").await.unwrap();

        let claims = service.validate_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, "student");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let service = service_with_ttl(15);
        assert!(matches!(
            service.validate("not-a-jwt"),
            Err(TokenError::TokenInvalid)
        ));
        assert!(matches!(
            service.validate("a.b"),
            Err(TokenError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn test_expired_access_token_rejected() {
        let service = service_with_ttl(-1);
        let pair = service.issue("user-1", "student").await.unwrap();
        assert!(matches!(
            service.validate(&pair.access_token),
            Err(TokenError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_bearer() {
        let service = service_with_ttl(15);
        let pair = service.issue("user-1", "student").await.unwrap();
        assert!(matches!(
            service.validate_access(&pair.refresh_token),
            Err(TokenError::WrongKind)
        ));
    }

    #[tokio::test]
    async fn test_refresh_mints_access_token() {
        let service = service_with_ttl(15);
        let pair = service.issue("user-1", "lecturer").await.unwrap();

        let new_access = service.refresh(&pair.refresh_token).await.unwrap();
        let claims = service.validate_access(&new_access).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, "lecturer");
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let service = service_with_ttl(15);
        let pair = service.issue("user-1", "student").await.unwrap();
        assert!(matches!(
            service.refresh(&pair.access_token).await,
            Err(TokenError::RefreshInvalid)
        ));
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_rejected() {
        let service = service_with_ttl(15);
        let pair = service.issue("user-1", "student").await.unwrap();

        service.revoke(&pair.refresh_token).await;
        assert!(matches!(
            service.refresh(&pair.refresh_token).await,
            Err(TokenError::RefreshInvalid)
        ));
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let service = service_with_ttl(15);
        let pair = service.issue("user-1", "student").await.unwrap();

        let other = TokenService::new(
            TokenConfig {
                jwt_secret: "different-secret".to_string(),
                ..TokenConfig::default()
            },
            Arc::new(InMemoryRefreshTokenStore::new()),
        );
        assert!(other.validate(&pair.access_token).is_err());
    }
}
