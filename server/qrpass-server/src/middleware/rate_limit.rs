//! Fixed-window request rate limiting
//!
//! In-memory limiter keyed by client IP, counting requests per one-minute
//! window. Rejections carry a retry-after hint so clients can back off
//! instead of hammering. Process-local; multi-instance deployments need an
//! external keyed store in front.

use crate::error::ApiError;
use crate::middleware::request_context;
use crate::server::QrPassServer;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

const WINDOW_SECONDS: u64 = 60;

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// In-memory fixed-window rate limiter (for single-instance deployments)
pub struct RateLimiter {
    max_per_window: u32,
    entries: RwLock<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    pub fn new(max_per_window: u32) -> Self {
        Self {
            max_per_window,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Count one request for the key, rejecting above the window limit
    pub async fn check(&self, key: &str) -> Result<(), ApiError> {
        let mut entries = self.entries.write().await;

        // Opportunistic cleanup so the map cannot grow without bound
        if entries.len() > 10_000 {
            entries.retain(|_, entry| entry.window_start.elapsed().as_secs() < WINDOW_SECONDS);
        }

        let now = Instant::now();
        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        let elapsed = entry.window_start.elapsed().as_secs();
        if elapsed >= WINDOW_SECONDS {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_per_window {
            let retry_after = WINDOW_SECONDS.saturating_sub(elapsed).max(1);
            return Err(ApiError::rate_limit(
                "Too many requests, slow down",
                retry_after,
            ));
        }

        entry.count += 1;
        Ok(())
    }
}

/// Best available client key: connect-info IP, then proxy headers
fn client_key(request: &Request) -> String {
    request_context::client_addr(request.extensions(), request.headers())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware, applied before any other screening
pub async fn rate_limit_middleware(
    State(server): State<QrPassServer>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    server.limiter.check(&client_key(&request)).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_requests_under_limit_pass() {
        let limiter = RateLimiter::new(5);
        for _ in 0..5 {
            assert!(limiter.check("10.0.0.1").await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_limit_exceeded_carries_retry_hint() {
        let limiter = RateLimiter::new(2);
        limiter.check("10.0.0.1").await.unwrap();
        limiter.check("10.0.0.1").await.unwrap();

        match limiter.check("10.0.0.1").await {
            Err(ApiError::RateLimited {
                retry_after_seconds,
                ..
            }) => {
                assert!(retry_after_seconds >= 1);
                assert!(retry_after_seconds <= WINDOW_SECONDS);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_keys_counted_independently() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check("10.0.0.1").await.is_ok());
        assert!(limiter.check("10.0.0.2").await.is_ok());
        assert!(limiter.check("10.0.0.1").await.is_err());
    }

    #[tokio::test]
    async fn test_window_restarts_after_expiry() {
        let limiter = RateLimiter::new(1);
        limiter.check("10.0.0.1").await.unwrap();
        assert!(limiter.check("10.0.0.1").await.is_err());

        // Age the window past its end
        {
            let mut entries = limiter.entries.write().await;
            if let Some(entry) = entries.get_mut("10.0.0.1") {
                if let Some(past) =
                    Instant::now().checked_sub(Duration::from_secs(WINDOW_SECONDS + 1))
                {
                    entry.window_start = past;
                }
            }
        }

        assert!(limiter.check("10.0.0.1").await.is_ok());
    }
}
