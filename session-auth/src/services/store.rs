//! Key-value store with per-key expiry backing the session records.

use async_trait::async_trait;
use uuid::Uuid;

use crate::services::StoreError;

/// Narrow capability over an external TTL store.
///
/// `get` and `take` report absent and expired keys alike as
/// [`StoreError::NotFound`]; `delete` of an absent key succeeds.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<String, StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Read and remove in one step; of two concurrent callers at most one gets the value.
    async fn take(&self, key: &str) -> Result<String, StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

pub fn session_key(access_id: &Uuid) -> String {
    format!("session:{}", access_id)
}

pub fn refresh_key(refresh_id: &Uuid) -> String {
    format!("refresh:{}", refresh_id)
}
