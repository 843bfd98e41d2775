use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};

use crate::services::{SessionStore, StoreError};

/// In-process [`SessionStore`] for tests and local development.
///
/// Entries expire against the tokio clock, so paused-time tests can advance past a TTL.
/// Reads purge the key they touch; every write sweeps all expired entries.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (unexpired) entry count.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().1 > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let now = Instant::now();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);

        let expires_at = now + Duration::from_secs(ttl_seconds.max(1));
        self.entries
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, StoreError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.1 > now {
                return Ok(entry.0.clone());
            }
        }
        // Lazily purge the expired entry.
        self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        Err(StoreError::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<String, StoreError> {
        let now = Instant::now();
        match self.entries.remove(key) {
            Some((_, (value, expires_at))) if expires_at > now => Ok(value),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("session:a", "value", 60).await.unwrap();
        assert_eq!(store.get("session:a").await.unwrap(), "value");

        store.delete("session:a").await.unwrap();
        assert!(matches!(store.get("session:a").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("refresh:missing").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store.put("refresh:b", "7", 5).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.get("refresh:b").await.unwrap(), "7");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(store.get("refresh:b").await, Err(StoreError::NotFound)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_take_is_single_shot() {
        let store = MemoryStore::new();
        store.put("refresh:c", "9", 60).await.unwrap();

        assert_eq!(store.take("refresh:c").await.unwrap(), "9");
        assert!(matches!(store.take("refresh:c").await, Err(StoreError::NotFound)));
        assert!(matches!(store.get("refresh:c").await, Err(StoreError::NotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_sweeps_expired_entries() {
        let store = MemoryStore::new();
        for i in 0..1000 {
            store.put(&format!("session:{}", i), "stale", 1).await.unwrap();
        }

        tokio::time::advance(Duration::from_secs(3600)).await;

        for i in 0..10 {
            store.put(&format!("refresh:{}", i), "live", 60).await.unwrap();
        }

        assert_eq!(store.len(), 10);
        assert_eq!(store.entries.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_value_and_ttl() {
        let store = MemoryStore::new();
        store.put("k", "old", 1).await.unwrap();
        store.put("k", "new", 10).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get("k").await.unwrap(), "new");
    }
}
