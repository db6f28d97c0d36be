//! In-process cache backed by a `HashMap`
//!
//! Expiry is measured on `tokio::time::Instant`, so tests running with a
//! paused clock can advance past a TTL without sleeping.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::{CacheFuture, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Thread-safe in-memory cache store.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| e.is_live(now)).count()
    }

    /// Whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl CacheStore for MemoryCache {
    fn fetch<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
        Box::pin(async move {
            let now = Instant::now();
            {
                let entries = self.entries.read().await;
                match entries.get(key) {
                    Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                    Some(_) => {}
                    None => return Ok(None),
                }
            }

            // Expired: drop it so the map does not grow with dead keys
            let mut entries = self.entries.write().await;
            if entries.get(key).is_some_and(|e| !e.is_live(now)) {
                entries.remove(key);
                debug!(key, "evicted expired cache entry");
            }
            Ok(None)
        })
    }

    fn save<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            // A TTL past the clock's range never expires
            let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
            self.entries
                .write()
                .await
                .insert(key.to_owned(), Entry { value, expires_at });
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
        Box::pin(async move {
            let removed = self.entries.write().await.remove(key);
            Ok(removed.is_some_and(|e| e.is_live(Instant::now())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_fetch() {
        let cache = MemoryCache::new();
        cache
            .save("k", "v".into(), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(cache.fetch("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = MemoryCache::new();
        assert!(cache.fetch("absent").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .save("k", "v".into(), Some(Duration::from_secs(300)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.fetch("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.fetch("k").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn no_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.save("ticket", "t".into(), None).await.unwrap();
        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert_eq!(cache.fetch("ticket").await.unwrap().as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn huge_ttl_is_kept_without_expiry() {
        let cache = MemoryCache::new();
        cache
            .save("k", "v".into(), Some(Duration::MAX))
            .await
            .unwrap();
        assert_eq!(cache.fetch("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn save_overwrites_previous_value() {
        let cache = MemoryCache::new();
        cache.save("k", "old".into(), None).await.unwrap();
        cache
            .save("k", "new".into(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(cache.fetch("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn delete_reports_removal() {
        let cache = MemoryCache::new();
        cache.save("k", "v".into(), None).await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
        assert!(cache.fetch("k").await.unwrap().is_none());
    }
}
