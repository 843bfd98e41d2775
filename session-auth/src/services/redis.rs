use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, RedisResult};
use std::future::Future;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::services::{SessionStore, StoreError};

/// Redis-backed [`SessionStore`]. Every round trip is bounded by the configured timeout.
#[derive(Clone)]
pub struct RedisStore {
    _client: Client,
    manager: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    pub async fn new(config: &StoreConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.redis_url, "Connecting to Redis");
        let client = Client::open(config.redis_url.clone())?;

        // Use ConnectionManager for automatic reconnection
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }
}

/// Run one Redis round trip under `timeout`, mapping an elapsed budget to [`StoreError::Timeout`].
async fn bounded<T, F>(timeout: Duration, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(|e| {
            tracing::error!(op, error = %e, "Redis command failed");
            StoreError::from(e)
        }),
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            tracing::error!(op, timeout_ms, "Redis command timed out");
            Err(StoreError::Timeout(timeout_ms))
        }
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .to_owned();
        bounded(self.timeout, "SET", cmd.query_async::<_, ()>(&mut conn)).await
    }

    async fn get(&self, key: &str) -> Result<String, StoreError> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("GET").arg(key).to_owned();
        let value: Option<String> = bounded(self.timeout, "GET", cmd.query_async(&mut conn)).await?;
        value.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("DEL").arg(key).to_owned();
        // DEL reports how many keys existed; zero is fine.
        let _removed: i64 = bounded(self.timeout, "DEL", cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<String, StoreError> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("GETDEL").arg(key).to_owned();
        let value: Option<String> = bounded(self.timeout, "GETDEL", cmd.query_async(&mut conn)).await?;
        value.ok_or(StoreError::NotFound)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("PING").to_owned();
        let _pong: String = bounded(self.timeout, "PING", cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}
