//! The session store.
//!
//! [`SessionStore`] ties the pieces together: it reads the session cookie
//! from request headers, resolves it to a cache entry, and on save writes the
//! payload back and issues a fresh cookie.
//!
//! # Load
//!
//! 1. No cookie → new empty session
//! 2. Cookie fails verification → new empty session, the rejection is
//!    reported in [`LoadedSession::cookie_error`]
//! 3. Cookie verifies → cache lookup; a miss yields a new session, a hit is
//!    deserialized and the session is no longer new
//!
//! # Save
//!
//! A non-positive cookie max-age deletes the cache entry and issues an
//! expired cookie. Otherwise the values are serialized, checked against the
//! length limit, written with a TTL, and only then is the cookie issued. A
//! failed cache write never produces a cookie.
//!
//! Every cache call is bounded by [`StoreConfig::operation_timeout`].
//! Dropping a store future cancels the cache call in flight.

use crate::cache::{RedisCache, SessionCache};
use crate::codec::Serializer;
use crate::config::StoreConfig;
use crate::cookie_codec::{CookieCodec, KeyPair, generate_session_id};
use crate::error::{CacheError, CookieError, Result, SessionError};
use crate::session::{CookieOptions, Session};
use cookie::Cookie;
use http::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use std::future::Future;
use std::time::Duration;

/// Result of [`SessionStore::load`].
#[derive(Debug, Clone)]
pub struct LoadedSession {
    /// The session, loaded or freshly created
    pub session: Session,
    /// Why the request cookie was rejected, if it was; always a
    /// recoverable [`SessionError::CookieDecode`]
    pub cookie_error: Option<SessionError>,
}

impl LoadedSession {
    /// Take the session, discarding the cookie diagnosis.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }
}

/// Cache-backed HTTP session store.
///
/// # Example
///
/// ```no_run
/// use redistore::{SessionStore, Value};
/// use http::HeaderMap;
///
/// # async fn example(request_headers: HeaderMap) -> redistore::Result<()> {
/// let store = SessionStore::connect("redis://127.0.0.1:6379", &["hash-key", "block-key"]).await?;
///
/// let mut session = store.load(&request_headers, "sess").await?.into_session();
/// session.insert("user", Value::from("alice"));
///
/// let mut response_headers = HeaderMap::new();
/// store.save(&mut session, &mut response_headers).await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionStore<C: SessionCache = RedisCache> {
    cache: C,
    codec: CookieCodec,
    config: StoreConfig,
}

impl SessionStore<RedisCache> {
    /// Connect to Redis and build a store with the default configuration.
    ///
    /// `key_pairs` alternates hash and block keys, see [`KeyPair::from_pairs`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Construction`] if Redis is unreachable or the
    /// keys are unusable.
    pub async fn connect<K: AsRef<[u8]>>(redis_url: &str, key_pairs: &[K]) -> Result<Self> {
        let cache = RedisCache::new(redis_url)
            .await
            .map_err(|e| SessionError::Construction(e.to_string()))?;

        Self::new(cache, key_pairs).await
    }
}

impl<C: SessionCache> SessionStore<C> {
    /// Build a store with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Construction`] if the cache does not answer a
    /// liveness check or the keys are unusable.
    pub async fn new<K: AsRef<[u8]>>(cache: C, key_pairs: &[K]) -> Result<Self> {
        Self::with_config(cache, key_pairs, StoreConfig::default()).await
    }

    /// Build a store with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Construction`] if the cache does not answer a
    /// liveness check or the keys are unusable.
    pub async fn with_config<K: AsRef<[u8]>>(
        cache: C,
        key_pairs: &[K],
        config: StoreConfig,
    ) -> Result<Self> {
        Self::with_key_pairs(cache, &KeyPair::from_pairs(key_pairs), config).await
    }

    /// Build a store from already assembled key pairs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Construction`] if the cache does not answer a
    /// liveness check or the keys are unusable.
    pub async fn with_key_pairs(cache: C, key_pairs: &[KeyPair], config: StoreConfig) -> Result<Self> {
        let mut codec = CookieCodec::new(key_pairs)
            .map_err(|e| SessionError::Construction(format!("Invalid session keys: {e}")))?;
        if let Some(max_age) = config.options.max_age {
            codec.set_max_age(max_age);
        }

        match tokio::time::timeout(config.ping_timeout, cache.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(SessionError::Construction(format!(
                    "Cache liveness check failed: {e}"
                )));
            }
            Err(_) => {
                return Err(SessionError::Construction(format!(
                    "Cache liveness check timed out after {:?}",
                    config.ping_timeout
                )));
            }
        }

        tracing::info!(
            key_prefix = %config.key_prefix,
            serializer = config.serializer.name(),
            key_pairs = key_pairs.len(),
            "Session store ready"
        );

        Ok(Self {
            cache,
            codec,
            config,
        })
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Cookie codec.
    #[must_use]
    pub const fn codec(&self) -> &CookieCodec {
        &self.codec
    }

    /// Set the maximum payload length in bytes (0 = unlimited).
    pub const fn set_max_length(&mut self, max_length: usize) {
        self.config.max_length = max_length;
    }

    /// Set the cache key prefix.
    pub fn set_key_prefix(&mut self, prefix: impl Into<String>) {
        self.config.key_prefix = prefix.into();
    }

    /// Set the payload codec.
    pub const fn set_serializer(&mut self, serializer: Serializer) {
        self.config.serializer = serializer;
    }

    /// Set the cookie max-age of new sessions and the codec's token max-age.
    pub const fn set_max_age(&mut self, seconds: i64) {
        self.config.options.max_age = Some(seconds);
        self.codec.set_max_age(seconds);
    }

    /// Set the cache TTL used when a session's cookie has no max-age.
    pub const fn set_default_max_age(&mut self, seconds: i64) {
        self.config.default_max_age = seconds;
    }

    /// Replace the default cookie options of new sessions.
    ///
    /// A `max_age` in the new options also becomes the codec's token max-age,
    /// as with [`set_max_age`](Self::set_max_age).
    pub fn set_options(&mut self, options: CookieOptions) {
        if let Some(max_age) = options.max_age {
            self.codec.set_max_age(max_age);
        }
        self.config.options = options;
    }

    /// Set the per-operation cache deadline.
    pub const fn set_operation_timeout(&mut self, timeout: Duration) {
        self.config.operation_timeout = timeout;
    }

    /// Create a new empty session carrying the default cookie options.
    #[must_use]
    pub fn new_session(&self, name: &str) -> Session {
        Session::new(name, self.config.options.clone())
    }

    /// Load the session `name` for a request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cache`] if the cache lookup fails (a miss is
    /// not a failure), or [`SessionError::Serialization`] if the stored
    /// payload cannot be decoded. A rejected cookie is not an error; see
    /// [`LoadedSession::cookie_error`].
    pub async fn load(&self, headers: &HeaderMap, name: &str) -> Result<LoadedSession> {
        let mut session = self.new_session(name);

        let Some(token) = request_cookie(headers, name) else {
            return Ok(LoadedSession {
                session,
                cookie_error: None,
            });
        };

        let session_id = match self.codec.decode(name, &token) {
            Ok(session_id) => session_id,
            Err(e) => {
                tracing::debug!(session_name = name, error = %e, "Rejected session cookie");
                return Ok(LoadedSession {
                    session,
                    cookie_error: Some(SessionError::CookieDecode(e)),
                });
            }
        };

        let cache_key = self.cache_key(&session_id);
        let payload = self
            .bounded(self.cache.get(&cache_key))
            .await
            .inspect_err(|e| {
                tracing::warn!(cache_key = %cache_key, error = %e, "Failed to read session from cache");
            })?;

        match payload {
            Some(bytes) => {
                self.config
                    .serializer
                    .deserialize(&bytes, session.values_mut())?;
                session.set_id(session_id);
                session.mark_loaded();

                tracing::debug!(
                    session_name = name,
                    cache_key = %cache_key,
                    payload_len = bytes.len(),
                    "Loaded session"
                );
            }
            None => {
                tracing::debug!(cache_key = %cache_key, "Session not found in cache, starting new one");
            }
        }

        Ok(LoadedSession {
            session,
            cookie_error: None,
        })
    }

    /// Save `session` and append its `Set-Cookie` header to `headers`.
    ///
    /// # Errors
    ///
    /// See [`save_cookie`](Self::save_cookie).
    pub async fn save(&self, session: &mut Session, headers: &mut HeaderMap) -> Result<()> {
        let cookie = self.save_cookie(session).await?;

        let value = HeaderValue::from_str(&cookie.to_string())
            .map_err(|e| SessionError::CookieEncode(CookieError::Encode(e.to_string())))?;
        headers.append(SET_COOKIE, value);

        Ok(())
    }

    /// Save `session` and return the cookie to send back.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Serialization`] if the values cannot be encoded
    /// - [`SessionError::PayloadTooLarge`] if the payload exceeds the limit
    /// - [`SessionError::Cache`] if the cache write or delete fails
    /// - [`SessionError::CookieEncode`] if the cookie cannot be issued
    pub async fn save_cookie(&self, session: &mut Session) -> Result<Cookie<'static>> {
        if session.options().is_deletion() {
            return self.delete(session).await;
        }

        if session.id().is_empty() {
            session.set_id(generate_session_id());
        }

        let payload = self.config.serializer.serialize(session.values())?;
        if self.config.max_length != 0 && payload.len() > self.config.max_length {
            return Err(SessionError::PayloadTooLarge {
                size: payload.len(),
                limit: self.config.max_length,
            });
        }

        let ttl = self.config.ttl_for(session.options().max_age);
        let cache_key = self.cache_key(session.id());
        self.bounded(self.cache.set(&cache_key, &payload, ttl))
            .await
            .inspect_err(|e| {
                tracing::warn!(cache_key = %cache_key, error = %e, "Failed to write session to cache");
            })?;

        let token = self
            .codec
            .encode(session.name(), session.id())
            .map_err(SessionError::CookieEncode)?;

        tracing::debug!(
            cache_key = %cache_key,
            payload_len = payload.len(),
            ttl_seconds = ttl.as_secs(),
            "Saved session"
        );

        Ok(session.options().to_cookie(session.name(), token))
    }

    async fn delete(&self, session: &Session) -> Result<Cookie<'static>> {
        // A session that was never saved has nothing in the cache
        if !session.id().is_empty() {
            let cache_key = self.cache_key(session.id());
            self.bounded(self.cache.delete(&cache_key))
                .await
                .inspect_err(|e| {
                    tracing::warn!(cache_key = %cache_key, error = %e, "Failed to delete session from cache");
                })?;

            tracing::debug!(cache_key = %cache_key, "Deleted session");
        }

        Ok(session.options().to_cookie(session.name(), String::new()))
    }

    fn cache_key(&self, session_id: &str) -> String {
        format!("{}{session_id}", self.config.key_prefix)
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = std::result::Result<T, CacheError>>,
    ) -> std::result::Result<T, CacheError> {
        let deadline = self.config.operation_timeout;
        tokio::time::timeout(deadline, operation)
            .await
            .unwrap_or(Err(CacheError::Timeout(deadline)))
    }
}

impl<C: SessionCache + std::fmt::Debug> std::fmt::Debug for SessionStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("cache", &self.cache)
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish()
    }
}

/// Value of the first request cookie called `name`.
fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(std::result::Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::MemoryCache;

    struct StalledCache;

    impl SessionCache for StalledCache {
        async fn set(&self, _: &str, _: &[u8], _: Duration) -> std::result::Result<(), CacheError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn get(&self, _: &str) -> std::result::Result<Option<Vec<u8>>, CacheError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn delete(&self, _: &str) -> std::result::Result<(), CacheError> {
            Ok(())
        }

        async fn ping(&self) -> std::result::Result<(), CacheError> {
            Ok(())
        }

        async fn ttl(&self, _: &str) -> std::result::Result<Option<Duration>, CacheError> {
            Ok(None)
        }
    }

    #[test]
    fn test_request_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; sess=abc"));
        headers.append(COOKIE, HeaderValue::from_static("sess=ignored; other=1"));

        assert_eq!(request_cookie(&headers, "sess").as_deref(), Some("abc"));
        assert_eq!(request_cookie(&headers, "other").as_deref(), Some("1"));
        assert_eq!(request_cookie(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn test_cache_key_uses_prefix() {
        let mut store = SessionStore::new(MemoryCache::new(), &["k1"]).await.unwrap();
        assert_eq!(store.cache_key("abc"), "gosession_abc");

        store.set_key_prefix("app_");
        assert_eq!(store.cache_key("abc"), "app_abc");
    }

    #[tokio::test]
    async fn test_set_max_age_updates_options_and_codec() {
        let mut store = SessionStore::new(MemoryCache::new(), &["k1"]).await.unwrap();
        store.set_max_age(3600);

        assert_eq!(store.new_session("sess").options().max_age, Some(3600));
        assert_eq!(store.codec().max_age(), 3600);
    }

    #[tokio::test]
    async fn test_set_options_updates_codec_max_age() {
        let mut store = SessionStore::new(MemoryCache::new(), &["k1"]).await.unwrap();
        store.set_options(CookieOptions {
            max_age: Some(120),
            ..CookieOptions::default()
        });

        assert_eq!(store.new_session("sess").options().max_age, Some(120));
        assert_eq!(store.codec().max_age(), 120);

        // Browser-session cookies keep the current token limit
        store.set_options(CookieOptions {
            max_age: None,
            ..CookieOptions::default()
        });
        assert_eq!(store.codec().max_age(), 120);
    }

    #[tokio::test]
    async fn test_stalled_cache_times_out() {
        let config = StoreConfig::new().with_operation_timeout(Duration::from_millis(50));
        let store = SessionStore::with_config(StalledCache, &["k1"], config)
            .await
            .unwrap();

        let mut session = store.new_session("sess");
        let err = store.save_cookie(&mut session).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Cache(CacheError::Timeout(Duration::from_millis(50)))
        );
    }

    #[tokio::test]
    async fn test_deleting_unsaved_session_skips_cache() {
        let cache = MemoryCache::new();
        let store = SessionStore::new(cache.clone(), &["k1"]).await.unwrap();
        cache.set_unavailable(true);

        let mut session = store.new_session("sess");
        session.options_mut().max_age = Some(-1);

        let cookie = store.save_cookie(&mut session).await.unwrap();
        assert_eq!(cookie.value(), "");
    }
}
