//! Redis-backed session cache.
//!
//! Payloads are stored as plain Redis strings with `SETEX`, so the entry's
//! Redis TTL is the session's lifetime.
//!
//! # Example
//!
//! ```no_run
//! use redistore::RedisCache;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisCache::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use super::SessionCache;
use crate::error::CacheError;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Redis cache gateway.
///
/// Cloning is cheap: all clones share the same `ConnectionManager`, which
/// multiplexes and reconnects on its own.
#[derive(Clone)]
pub struct RedisCache {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379/8")
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the connection cannot be established.
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {e}")))?;

        Self::from_client(client).await
    }

    /// Wrap an existing Redis client.
    ///
    /// # Errors
    ///
    /// Returns error if the connection manager cannot be created.
    pub async fn from_client(client: Client) -> Result<Self, CacheError> {
        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    /// Wrap an already established connection manager.
    #[must_use]
    pub const fn from_connection_manager(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }
}

impl SessionCache for RedisCache {
    async fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();

        // SETEX rejects a zero expiry
        let ttl_seconds = ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(key, payload, ttl_seconds)
            .await
            .map_err(|e| CacheError::Command(format!("Failed to store session: {e}")))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn_manager.clone();

        let payload: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Command(format!("Failed to get session from Redis: {e}")))?;

        Ok(payload.filter(|bytes| !bytes.is_empty()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();

        let _: () = conn.del(key).await.map_err(|e| {
            CacheError::Command(format!("Failed to delete session from Redis: {e}"))
        })?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();

        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Connection(format!("Redis did not answer PING: {e}")))?;

        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let mut conn = self.conn_manager.clone();

        let ttl_seconds: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| CacheError::Command(format!("Failed to get session TTL: {e}")))?;

        match ttl_seconds {
            // -2: key doesn't exist, -1: key has no expiration
            seconds if seconds > 0 => Ok(Some(Duration::from_secs(seconds.unsigned_abs()))),
            _ => Ok(None),
        }
    }
}
