//! Store configuration.

use crate::codec::Serializer;
use crate::session::CookieOptions;
use std::time::Duration;

/// Session store configuration.
///
/// # Example
///
/// ```
/// use redistore::{Serializer, StoreConfig};
/// use std::time::Duration;
///
/// let config = StoreConfig::new()
///     .with_key_prefix("myapp_session_")
///     .with_max_length(8192)
///     .with_serializer(Serializer::Json)
///     .with_operation_timeout(Duration::from_secs(2));
///
/// assert_eq!(config.key_prefix, "myapp_session_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Prefix prepended to every session id to form the cache key
    pub key_prefix: String,

    /// Cache TTL in seconds for sessions whose cookie has no max-age
    pub default_max_age: i64,

    /// Maximum serialized payload length in bytes (0 = unlimited)
    pub max_length: usize,

    /// Payload codec
    pub serializer: Serializer,

    /// Cookie options copied into every new session
    pub options: CookieOptions,

    /// Deadline for each individual cache operation
    pub operation_timeout: Duration,

    /// Deadline for the liveness check made at construction
    pub ping_timeout: Duration,
}

impl StoreConfig {
    /// Default cache key prefix.
    pub const DEFAULT_KEY_PREFIX: &'static str = "gosession_";

    /// Default cache TTL: 20 minutes.
    pub const DEFAULT_MAX_AGE: i64 = 60 * 20;

    /// Default payload limit: 4 KiB.
    pub const DEFAULT_MAX_LENGTH: usize = 4096;

    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the default cache TTL in seconds.
    #[must_use]
    pub const fn with_default_max_age(mut self, seconds: i64) -> Self {
        self.default_max_age = seconds;
        self
    }

    /// Set the maximum payload length (0 = unlimited).
    #[must_use]
    pub const fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the payload codec.
    #[must_use]
    pub const fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Set the default cookie options.
    #[must_use]
    pub fn with_options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the per-operation cache deadline.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set the construction liveness-check deadline.
    #[must_use]
    pub const fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// Cache TTL for a session saved with cookie max-age `max_age`.
    ///
    /// Falls back to [`default_max_age`](Self::default_max_age) when the
    /// cookie carries none. Never shorter than one second.
    #[must_use]
    pub fn ttl_for(&self, max_age: Option<i64>) -> Duration {
        let seconds = max_age.unwrap_or(self.default_max_age).max(1);
        Duration::from_secs(seconds.unsigned_abs())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: Self::DEFAULT_KEY_PREFIX.to_string(),
            default_max_age: Self::DEFAULT_MAX_AGE,
            max_length: Self::DEFAULT_MAX_LENGTH,
            serializer: Serializer::default(),
            options: CookieOptions::default(),
            operation_timeout: Duration::from_secs(5),
            ping_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.key_prefix, "gosession_");
        assert_eq!(config.default_max_age, 1200);
        assert_eq!(config.max_length, 4096);
        assert_eq!(config.serializer, Serializer::Bincode);
        assert_eq!(config.options.path.as_deref(), Some("/"));
        assert_eq!(config.options.max_age, Some(86_400 * 30));
        assert_eq!(config.operation_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .with_key_prefix("app_")
            .with_default_max_age(60)
            .with_max_length(0)
            .with_ping_timeout(Duration::from_millis(100));

        assert_eq!(config.key_prefix, "app_");
        assert_eq!(config.default_max_age, 60);
        assert_eq!(config.max_length, 0);
        assert_eq!(config.ping_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_ttl_for() {
        let config = StoreConfig::new();
        assert_eq!(config.ttl_for(Some(3600)), Duration::from_secs(3600));
        assert_eq!(config.ttl_for(None), Duration::from_secs(1200));

        let config = config.with_default_max_age(0);
        assert_eq!(config.ttl_for(None), Duration::from_secs(1));
    }
}
