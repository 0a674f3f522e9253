//! Failed-login tracking
//!
//! In-memory counter keyed by login identifier, used by the login route to
//! lock accounts after repeated failures. The window restarts wholesale: a
//! failure more than one hour after the first recorded failure begins a new
//! record at count 1, rather than sliding individual attempts out.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// How long a record stays live after its first failure
const ATTEMPT_WINDOW: Duration = Duration::hours(1);

/// Per-identifier failure record
#[derive(Debug, Clone)]
pub struct FailedLoginRecord {
    pub count: u32,
    pub first_attempt_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
}

/// Store of failed login attempts
///
/// Injected into the login route so single-instance deployments can use the
/// in-memory map while multi-instance deployments back it with an external
/// keyed store.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Record one failure and return the current count
    async fn record_failure(&self, identifier: &str) -> u32;

    /// Clear the record (successful login or admin reset)
    async fn reset(&self, identifier: &str);

    /// Current failure count; 0 when absent or expired
    async fn get_count(&self, identifier: &str) -> u32;
}

/// In-memory attempt store (for single-instance deployments)
pub struct InMemoryAttemptStore {
    entries: RwLock<HashMap<String, FailedLoginRecord>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn is_expired(record: &FailedLoginRecord, now: DateTime<Utc>) -> bool {
        now - record.first_attempt_at > ATTEMPT_WINDOW
    }
}

impl Default for InMemoryAttemptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn record_failure(&self, identifier: &str) -> u32 {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        // Opportunistic cleanup so the map cannot grow without bound
        if entries.len() > 10_000 {
            entries.retain(|_, record| !Self::is_expired(record, now));
        }

        let record = entries
            .entry(identifier.to_string())
            .and_modify(|record| {
                if Self::is_expired(record, now) {
                    // Window restart, not sliding expiry
                    record.count = 1;
                    record.first_attempt_at = now;
                } else {
                    record.count += 1;
                }
                record.last_attempt_at = now;
            })
            .or_insert_with(|| FailedLoginRecord {
                count: 1,
                first_attempt_at: now,
                last_attempt_at: now,
            });

        record.count
    }

    async fn reset(&self, identifier: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(identifier);
    }

    async fn get_count(&self, identifier: &str) -> u32 {
        let entries = self.entries.read().await;
        match entries.get(identifier) {
            Some(record) if !Self::is_expired(record, Utc::now()) => record.count,
            _ => 0,
        }
    }
}
