use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Hash a refresh token for storage with SHA-256
///
/// Raw refresh tokens are never persisted; only their hashes are kept so a
/// leaked store cannot be replayed.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Store of currently-valid refresh token hashes
///
/// Injected behind a trait so single-instance deployments can use the
/// in-memory map while multi-instance deployments plug in an external
/// keyed store.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Register a refresh token hash with its expiry
    async fn insert(&self, token_hash: &str, expires_at: DateTime<Utc>);

    /// Whether the hash is known and unexpired
    async fn contains(&self, token_hash: &str) -> bool;

    /// Drop a hash (logout/revocation)
    async fn remove(&self, token_hash: &str);

    /// Drop all expired hashes, returning how many were removed
    async fn purge_expired(&self) -> usize;
}

/// In-memory refresh token store (for single-instance deployments)
pub struct InMemoryRefreshTokenStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(&self, token_hash: &str, expires_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;

        // Opportunistic cleanup so the map cannot grow without bound
        if entries.len() > 10_000 {
            let now = Utc::now();
            entries.retain(|_, expiry| *expiry > now);
        }

        entries.insert(token_hash.to_string(), expires_at);
    }

    async fn contains(&self, token_hash: &str) -> bool {
        let entries = self.entries.read().await;
        match entries.get(token_hash) {
            Some(expiry) => *expiry > Utc::now(),
            None => false,
        }
    }

    async fn remove(&self, token_hash: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(token_hash);
    }

    async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Utc::now();
        entries.retain(|_, expiry| *expiry > now);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_insert_and_contains() {
        let store = InMemoryRefreshTokenStore::new();
        let hash = hash_token("some-refresh-token");

        store.insert(&hash, Utc::now() + Duration::days(7)).await;
        assert!(store.contains(&hash).await);

        store.remove(&hash).await;
        assert!(!store.contains(&hash).await);
    }

    #[tokio::test]
    async fn test_expired_entry_not_contained() {
        let store = InMemoryRefreshTokenStore::new();
        let hash = hash_token("stale-token");

        store.insert(&hash, Utc::now() - Duration::seconds(1)).await;
        assert!(!store.contains(&hash).await);

        assert_eq!(store.purge_expired().await, 1);
    }

    #[test]
    fn test_hash_is_stable_and_opaque() {
        let a = hash_token("token");
        let b = hash_token("token");
        assert_eq!(a, b);
        assert_ne!(a, "token");
    }
}
