use async_trait::async_trait;
use std::time::Duration;

/// Key/value store with per-entry time-to-live.
///
/// Implementations must be safe to call concurrently and expire entries on
/// their own once the ttl elapses; the gateway never deletes entries and
/// performs no read-modify-write sequences beyond plain get/set.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<serde_json::Value>;
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);
}
