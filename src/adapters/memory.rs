use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::domain::ports::CacheStore;

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// In-process `CacheStore` backed by a concurrent map.
///
/// Stands in for the shared cache the service fronts in production (Redis in
/// the original deployment). Expired entries are dropped lazily on the next
/// read of their key.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries, mainly useful in tests.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }

        None
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}
