//! Key-value cache gateway.
//!
//! The session store only needs four operations from its cache: write with a
//! time-to-live, read, delete and a liveness check. [`SessionCache`] captures
//! exactly that, [`RedisCache`] implements it on top of Redis.
//!
//! # Implementation Notes
//!
//! - A missing key and a zero-length payload are the same "not found" outcome
//! - Deleting a missing key is not an error
//! - Implementations never wait unboundedly on their own; the store bounds
//!   every call with its configured operation timeout

mod redis_cache;

pub use redis_cache::RedisCache;

use crate::error::CacheError;
use std::future::Future;
use std::time::Duration;

/// Session cache.
///
/// Implementations must be safe to share between concurrently running
/// requests; the store never serializes access to them.
pub trait SessionCache: Send + Sync {
    /// Store `payload` under `key`, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    fn set(
        &self,
        key: &str,
        payload: &[u8],
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Fetch the payload stored under `key`.
    ///
    /// # Returns
    ///
    /// `None` when the key is absent or holds an empty payload.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails for any other reason.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, CacheError>> + Send;

    /// Remove `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the delete fails. A missing key is not a failure.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Check that the cache is reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the cache does not answer.
    fn ping(&self) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Get the remaining time to live of `key`.
    ///
    /// # Returns
    ///
    /// `None` if the key does not exist or never expires.
    ///
    /// # Errors
    ///
    /// Returns error if the read fails.
    fn ttl(&self, key: &str) -> impl Future<Output = Result<Option<Duration>, CacheError>> + Send;
}
