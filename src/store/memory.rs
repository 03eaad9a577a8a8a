//! In-memory KV store.
//!
//! # Responsibilities
//! - Back the Health Store with a concurrent map
//! - Enforce per-entry TTL lazily on read
//!
//! # Design Decisions
//! - DashMap for internal synchronization (readers never block writers)
//! - `tokio::time::Instant` so paused-clock tests can drive expiry
//! - Expired entries are dropped on the read path; no sweeper task

use std::time::Duration;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::store::{KvStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// DashMap-backed store with lazy TTL expiry.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    inner: DashMap<String, Entry>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including not-yet-collected expired ones.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        if let Some(entry) = self.inner.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Drop the read guard before removing, DashMap deadlocks otherwise
        self.inner.remove_if(key, |_, e| e.is_expired(now));
        Ok(None)
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|t| Instant::now() + t),
        };
        self.inner.insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .inner
            .iter()
            .filter(|r| r.key().starts_with(prefix) && !r.value().is_expired(now))
            .map(|r| r.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryKvStore::new();
        store.put("health:a", "up", None).unwrap();
        assert_eq!(store.get("health:a").unwrap().as_deref(), Some("up"));

        store.put("health:a", "down", None).unwrap();
        assert_eq!(store.get("health:a").unwrap().as_deref(), Some("down"));

        store.delete("health:a").unwrap();
        assert_eq!(store.get("health:a").unwrap(), None);
        // Deleting again is fine
        store.delete("health:a").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let store = MemoryKvStore::new();
        store
            .put("health:a", "down", Some(Duration::from_secs(120)))
            .unwrap();

        tokio::time::advance(Duration::from_secs(119)).await;
        assert_eq!(store.get("health:a").unwrap().as_deref(), Some("down"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("health:a").unwrap(), None);
        // Expired entry was collected on read
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_resets_ttl() {
        let store = MemoryKvStore::new();
        store.put("k", "v1", Some(Duration::from_secs(10))).unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        store.put("k", "v2", Some(Duration::from_secs(10))).unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_prefix_skips_expired() {
        let store = MemoryKvStore::new();
        store.put("health:a", "up", None).unwrap();
        store
            .put("health:b", "down", Some(Duration::from_secs(5)))
            .unwrap();
        store.put("failover:last", "{}", None).unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;
        let keys = store.list("health:").unwrap();
        assert_eq!(keys, vec!["health:a".to_string()]);
    }
}
