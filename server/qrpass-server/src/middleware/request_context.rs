//! Request context extraction for security and tracing
//!
//! Collects per-request metadata: request ID, origin/referer, client address,
//! and a derived device fingerprint. The fingerprint is attached for
//! anomaly/audit purposes only; it is never an access-control input.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, Extensions, HeaderMap};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Request context containing security and tracing information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request ID for tracing
    pub request_id: String,
    /// Origin header value
    pub origin: Option<String>,
    /// Referer header value
    pub referer: Option<String>,
    /// User-Agent header value
    pub user_agent: Option<String>,
    /// Remote IP address
    pub remote_addr: Option<String>,
    /// Request timestamp (seconds since epoch)
    pub timestamp: u64,
    /// Derived device fingerprint (audit only)
    pub device_fingerprint: String,
    /// Origin allowlist check result
    pub origin_allowed: bool,
}

fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl RequestContext {
    /// Create a new request context with generated request ID
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            origin: None,
            referer: None,
            user_agent: None,
            remote_addr: None,
            timestamp: now_epoch_seconds(),
            device_fingerprint: String::new(),
            origin_allowed: true,
        }
    }

    /// Create from headers with origin screening and fingerprinting
    pub fn from_headers(
        headers: &HeaderMap,
        remote_addr: Option<String>,
        allowed_origins: &[String],
    ) -> Self {
        let origin = header_string(headers, header::ORIGIN.as_str());
        let referer = header_string(headers, header::REFERER.as_str());
        let user_agent = header_string(headers, header::USER_AGENT.as_str());

        // Honor an upstream request ID when a proxy already assigned one
        let request_id = header_string(headers, "X-Request-ID")
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let origin_allowed = Self::check_origin(&origin, &referer, allowed_origins);
        let device_fingerprint = Self::fingerprint(headers, remote_addr.as_deref());

        Self {
            request_id,
            origin,
            referer,
            user_agent,
            remote_addr,
            timestamp: now_epoch_seconds(),
            device_fingerprint,
            origin_allowed,
        }
    }

    /// Derive the device fingerprint from request metadata
    ///
    /// Hash of user agent, accept-language, client IP, and the platform hint
    /// header. Hex SHA-256 so logs never carry the raw combination.
    fn fingerprint(headers: &HeaderMap, remote_addr: Option<&str>) -> String {
        let user_agent = header_string(headers, header::USER_AGENT.as_str()).unwrap_or_default();
        let accept_language =
            header_string(headers, header::ACCEPT_LANGUAGE.as_str()).unwrap_or_default();
        let platform = header_string(headers, "Sec-CH-UA-Platform").unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(user_agent.as_bytes());
        hasher.update(b"|");
        hasher.update(accept_language.as_bytes());
        hasher.update(b"|");
        hasher.update(remote_addr.unwrap_or_default().as_bytes());
        hasher.update(b"|");
        hasher.update(platform.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check Origin (or Referer, when Origin is absent) against the allowlist
    ///
    /// Same-origin requests without either header pass; an unknown origin
    /// fails. An empty allowlist disables origin screening.
    fn check_origin(
        origin: &Option<String>,
        referer: &Option<String>,
        allowed_origins: &[String],
    ) -> bool {
        if allowed_origins.is_empty() {
            return true;
        }

        let candidate = origin.as_deref().or(referer.as_deref());
        let Some(value) = candidate else {
            return true;
        };

        let allowed = origin_host_allowed(value, allowed_origins);
        if !allowed {
            tracing::warn!(origin = value, "Origin not in allowed list");
        }
        allowed
    }
}

/// Whether an Origin/Referer value points at an allowlisted host
///
/// Matches on the host part only, so schemes and ports never need listing;
/// subdomains of an allowlisted host are accepted.
pub fn origin_host_allowed(value: &str, allowed_origins: &[String]) -> bool {
    let host = value
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .split('/')
        .next()
        .unwrap_or(value)
        .split(':')
        .next()
        .unwrap_or(value);

    allowed_origins
        .iter()
        .any(|a| host == a || host.ends_with(&format!(".{a}")))
}

/// Client address: connect-info first, then proxy headers
pub(crate) fn client_addr(extensions: &Extensions, headers: &HeaderMap) -> Option<String> {
    extensions
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .or_else(|| {
            header_string(headers, "X-Forwarded-For")
                .map(|s| s.split(',').next().unwrap_or("").trim().to_string())
        })
        .or_else(|| header_string(headers, "X-Real-IP"))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The screening middleware normally runs first and stashes the
        // context it built; reuse it so the fingerprint is computed once.
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }

        let remote_addr = client_addr(&parts.extensions, &parts.headers);
        let ctx = RequestContext::from_headers(&parts.headers, remote_addr, &[]);

        tracing::debug!(
            request_id = %ctx.request_id,
            fingerprint = %ctx.device_fingerprint,
            "Request context extracted"
        );

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_context_new() {
        let ctx = RequestContext::new();
        assert!(!ctx.request_id.is_empty());
        assert!(ctx.origin_allowed);
    }

    #[test]
    fn test_fingerprint_varies_with_metadata() {
        let mut a = HeaderMap::new();
        a.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        a.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB"));

        let mut b = HeaderMap::new();
        b.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        b.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("sw-KE"));

        let fp_a = RequestContext::from_headers(&a, Some("10.0.0.1".to_string()), &[]);
        let fp_b = RequestContext::from_headers(&b, Some("10.0.0.1".to_string()), &[]);
        assert_ne!(fp_a.device_fingerprint, fp_b.device_fingerprint);
    }

    #[test]
    fn test_fingerprint_stable_for_same_metadata() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));

        let a = RequestContext::from_headers(&headers, Some("10.0.0.1".to_string()), &[]);
        let b = RequestContext::from_headers(&headers, Some("10.0.0.1".to_string()), &[]);
        assert_eq!(a.device_fingerprint, b.device_fingerprint);
    }

    #[test]
    fn test_no_origin_or_referer_allowed() {
        let allowed = vec!["localhost".to_string()];
        assert!(RequestContext::check_origin(&None, &None, &allowed));
    }

    #[test]
    fn test_unknown_origin_blocked() {
        let allowed = vec!["localhost".to_string()];
        let origin = Some("https://evil.example.com".to_string());
        assert!(!RequestContext::check_origin(&origin, &None, &allowed));
    }

    #[test]
    fn test_allowed_origin_with_port() {
        let allowed = vec!["localhost".to_string()];
        let origin = Some("http://localhost:3000".to_string());
        assert!(RequestContext::check_origin(&origin, &None, &allowed));
    }

    #[test]
    fn test_subdomain_of_allowed_host_accepted() {
        let allowed = vec!["example.com".to_string()];
        assert!(origin_host_allowed("https://app.example.com", &allowed));
        assert!(!origin_host_allowed("https://example.com.evil.io", &allowed));
    }

    #[test]
    fn test_empty_allowlist_disables_screening() {
        let origin = Some("https://anywhere.example.com".to_string());
        assert!(RequestContext::check_origin(&origin, &None, &[]));
    }

    #[test]
    fn test_upstream_request_id_honored() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-ID", HeaderValue::from_static("req-123"));
        let ctx = RequestContext::from_headers(&headers, None, &[]);
        assert_eq!(ctx.request_id, "req-123");
    }
}
