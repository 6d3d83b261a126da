//! # Redistore
//!
//! Server-side HTTP sessions kept in Redis, bound to the client through an
//! authenticated (optionally encrypted) cookie.
//!
//! ## Features
//!
//! - **Cache-backed**: session payloads live in Redis with a TTL, never in process memory
//! - **Authenticated cookies**: the cookie only carries a signed or sealed session id
//! - **Key rotation**: several key pairs, the first one encodes, all of them decode
//! - **Two codecs**: compact `bincode` payloads or human-readable JSON
//! - **Testable**: an in-memory cache double ships behind the `test-utils` feature
//!
//! ## Request Flow
//!
//! ```text
//! Cookie header → CookieCodec::decode → SessionCache::get → Serializer::deserialize → Session
//! Session → Serializer::serialize → size check → SessionCache::set → CookieCodec::encode → Set-Cookie
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use redistore::{SessionStore, Value};
//!
//! let store = SessionStore::connect("redis://127.0.0.1:6379", &[b"hash-key"]).await?;
//!
//! let mut loaded = store.load(request.headers(), "sess").await?;
//! loaded.session.insert("user", Value::from("alice"));
//!
//! let mut response_headers = http::HeaderMap::new();
//! store.save(&mut loaded.session, &mut response_headers).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod cache;
pub mod codec;
pub mod config;
pub mod cookie_codec;
pub mod error;
pub mod registry;
pub mod session;
pub mod store;
pub mod value;

// Test doubles
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use cache::{RedisCache, SessionCache};
pub use codec::Serializer;
pub use config::StoreConfig;
pub use cookie_codec::{CookieCodec, KeyPair, generate_session_id};
pub use error::{CacheError, CookieError, Result, SerializationError, SessionError};
pub use registry::SessionRegistry;
pub use session::{CookieOptions, Session};
pub use store::{LoadedSession, SessionStore};
pub use value::{Key, Value, Values};
