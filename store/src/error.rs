//! Error types for session loading and saving.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for session store operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session values could not be converted to or from bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// The JSON codec only accepts string keys.
    #[error("non-string key {key}, cannot serialize session to JSON")]
    NonStringKey {
        /// Debug rendering of the offending key
        key: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON codec error: {0}")]
    Json(String),

    /// Bincode encoding or decoding failed.
    #[error("bincode codec error: {0}")]
    Binary(String),
}

/// The session cookie could not be produced or verified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CookieError {
    /// No key pairs were configured.
    #[error("at least one key pair is required")]
    NoKeys,

    /// A key pair could not be turned into a cookie key.
    #[error("invalid cookie key: {0}")]
    InvalidKey(String),

    /// The token decoded, but its plaintext is not `timestamp|id`.
    #[error("malformed session cookie: {0}")]
    Malformed(String),

    /// No configured key verified the token.
    #[error("session cookie failed authentication")]
    Unauthenticated,

    /// The token verified, but was issued too long ago.
    #[error("session cookie expired (issued at {issued_at}, max age {max_age}s)")]
    Expired {
        /// Unix timestamp embedded in the token
        issued_at: i64,
        /// Codec max-age in seconds
        max_age: i64,
    },

    /// The token exceeds the cookie length limit.
    #[error("session cookie is {len} bytes, limit is {max}")]
    ValueTooLong {
        /// Token length in bytes
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// The cookie could not be sealed or rendered.
    #[error("failed to encode session cookie: {0}")]
    Encode(String),
}

/// A key-value cache operation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache could not be reached.
    #[error("cache connection error: {0}")]
    Connection(String),

    /// The cache rejected or failed a command.
    #[error("cache command failed: {0}")]
    Command(String),

    /// The operation did not finish before its deadline.
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Error taxonomy of the session store.
///
/// Load failures that are safe to degrade (missing or rejected cookie, cache
/// miss) never show up here as `Err`; everything else is surfaced, because a
/// session that looks saved but wasn't is a correctness bug.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    // ═══════════════════════════════════════════════════════════
    // Payload Errors
    // ═══════════════════════════════════════════════════════════

    /// Values could not be serialized or deserialized.
    #[error("session serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    /// The serialized session exceeds the configured maximum length.
    #[error("session payload is {size} bytes, exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Serialized size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    // ═══════════════════════════════════════════════════════════
    // Cookie Errors
    // ═══════════════════════════════════════════════════════════

    /// The request cookie failed verification.
    #[error("session cookie rejected: {0}")]
    CookieDecode(CookieError),

    /// The response cookie could not be produced.
    #[error("session cookie could not be issued: {0}")]
    CookieEncode(CookieError),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The cache failed.
    #[error("session cache error: {0}")]
    Cache(#[from] CacheError),

    /// The store could not be constructed.
    #[error("session store construction failed: {0}")]
    Construction(String),
}

impl SessionError {
    /// Returns `true` if the caller can carry on with a fresh session.
    ///
    /// # Examples
    ///
    /// ```
    /// # use redistore::{CookieError, SessionError};
    /// assert!(SessionError::CookieDecode(CookieError::Unauthenticated).is_recoverable());
    /// assert!(!SessionError::Construction("down".into()).is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::CookieDecode(_))
    }

    /// Returns `true` if this error came from the cache.
    #[must_use]
    pub const fn is_cache_error(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}
