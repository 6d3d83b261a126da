//! In-memory session cache for testing.

use crate::cache::SessionCache;
use crate::error::CacheError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    payload: Vec<u8>,
    /// `None` when the TTL runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

/// In-memory session cache.
///
/// Honours TTLs, counts reads and writes, and can be switched into an
/// "unavailable" mode where every operation fails. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Inner>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `get` calls made so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls made so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Whether a live entry exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn contains(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live_entry(key)?.is_some())
    }

    /// Raw payload stored under `key`, bypassing read accounting.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.live_entry(key)?.map(|entry| entry.payload))
    }

    /// Number of live entries.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn len(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .values()
            .filter(|entry| entry.is_live(now))
            .count())
    }

    /// Whether the cache holds no live entries.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.inner
            .entries
            .lock()
            .map_err(|_| CacheError::Command("Mutex lock failed".to_string()))
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("memory cache marked unavailable".to_string()));
        }
        Ok(())
    }

    fn live_entry(&self, key: &str) -> Result<Option<Entry>, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
        }
        Ok(None)
    }
}

impl SessionCache for MemoryCache {
    async fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.check_available()?;
        self.inner.writes.fetch_add(1, Ordering::SeqCst);

        let entry = Entry {
            payload: payload.to_vec(),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.lock()?.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.check_available()?;
        self.inner.reads.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .live_entry(key)?
            .map(|entry| entry.payload)
            .filter(|payload| !payload.is_empty()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check_available()?;
        self.lock()?.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_available()
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        self.check_available()?;
        Ok(self
            .live_entry(key)?
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now())))
    }
}
