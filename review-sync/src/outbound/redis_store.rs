//! Redis-backed credential store.
//!
//! One `bb8` pool is shared by every read. The adapter only exposes the two
//! commands the credential source needs: cursor-based `SCAN` and `GET`.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, AsyncCommands, RedisError};

use crate::domain::ports::{KeyValueStore, KeyValueStoreError, ScanCursor, ScanPage};

const SCAN_COUNT: u32 = 100;

/// Configuration for the Redis connection pool.
///
/// # Example
///
/// ```ignore
/// let config = RedisPoolConfig::new("redis://localhost:6379")
///     .with_max_size(8)
///     .with_connection_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    redis_url: String,
    max_size: u32,
    min_idle: u32,
    connection_timeout: Duration,
}

impl RedisPoolConfig {
    /// Create a configuration for `redis_url` with 4 connections, one kept
    /// idle, and a 30 second checkout timeout.
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            max_size: 4,
            min_idle: 1,
            connection_timeout: Duration::from_secs(30),
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// Set the number of idle connections the pool keeps open, capped at the
    /// pool size. At least one is always kept so start-up proves Redis is
    /// reachable.
    pub fn with_min_idle(mut self, min_idle: u32) -> Self {
        self.min_idle = min_idle.max(1);
        self
    }

    /// Set the connection checkout timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Get the Redis URL.
    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }
}

/// Credential store reading from Redis through a connection pool.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisKeyValueStore {
    /// Build the pool and open its idle connections.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Connection`] when the URL is invalid or
    /// the idle connections cannot be opened.
    pub async fn connect(config: RedisPoolConfig) -> Result<Self, KeyValueStoreError> {
        let manager = RedisConnectionManager::new(config.redis_url.as_str())
            .map_err(|err| KeyValueStoreError::connection(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle.min(config.max_size)))
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| KeyValueStoreError::connection(err.to_string()))?;
        Ok(Self { pool })
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, KeyValueStoreError> {
        self.pool.get().await.map_err(map_checkout_error)
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn scan(
        &self,
        cursor: ScanCursor,
        pattern: &str,
    ) -> Result<ScanPage, KeyValueStoreError> {
        let mut conn = self.connection().await?;
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor.get())
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_COUNT)
            .query_async(&mut *conn)
            .await
            .map_err(map_command_error)?;
        Ok(ScanPage {
            keys,
            next: ScanCursor::new(next),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(map_command_error)?;
        Ok(value)
    }
}

fn map_checkout_error(error: RunError<RedisError>) -> KeyValueStoreError {
    match error {
        RunError::User(err) => KeyValueStoreError::connection(err.to_string()),
        RunError::TimedOut => KeyValueStoreError::connection("timed out waiting for a connection"),
    }
}

fn map_command_error(error: RedisError) -> KeyValueStoreError {
    if error.is_io_error() || error.is_connection_dropped() {
        KeyValueStoreError::connection(error.to_string())
    } else {
        KeyValueStoreError::command(error.to_string())
    }
}
