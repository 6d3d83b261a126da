//! Session identifiers and the authenticated cookie that carries them.
//!
//! The cookie never contains session data, only the session id, sealed with
//! the `cookie` crate's private (AES-256-GCM) or signed (HMAC-SHA256) jars.
//! Both bind the token to the cookie name, so a token minted for one session
//! name is rejected under another.
//!
//! # Token layout
//!
//! ```text
//! seal(key, name, "<unix seconds>|<session id>")
//! ```
//!
//! The timestamp lets the codec enforce its own max-age independently of the
//! browser honouring `Max-Age`.
//!
//! # Key rotation
//!
//! Encoding always uses the first key pair. Decoding tries every pair in the
//! order given, so new keys go first and retired keys stay at the end until
//! the cookies they issued have expired.

use crate::error::CookieError;
use base64::Engine;
use cookie::{Cookie, CookieJar, Key};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Longest token accepted or produced.
pub const MAX_TOKEN_LENGTH: usize = 4096;

/// Default codec max-age: 30 days.
pub const DEFAULT_COOKIE_MAX_AGE: i64 = 86_400 * 30;

/// Generate a new session identifier.
///
/// Returns 256 random bits encoded as unpadded base64url (43 characters).
#[must_use]
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let mut random_bytes = [0u8; 32];
    rng.fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Authentication key and optional encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Key used to authenticate the token
    pub hash_key: Vec<u8>,
    /// Key used to encrypt the token; `None` signs without encrypting
    pub block_key: Option<Vec<u8>>,
}

impl KeyPair {
    /// Create a pair that signs and encrypts.
    #[must_use]
    pub fn new(hash_key: impl Into<Vec<u8>>, block_key: impl Into<Vec<u8>>) -> Self {
        Self {
            hash_key: hash_key.into(),
            block_key: Some(block_key.into()),
        }
    }

    /// Create a pair that only signs.
    #[must_use]
    pub fn signing_only(hash_key: impl Into<Vec<u8>>) -> Self {
        Self {
            hash_key: hash_key.into(),
            block_key: None,
        }
    }

    /// Build pairs from a flat list of alternating hash and block keys.
    ///
    /// A missing or empty block key yields a signing-only pair.
    ///
    /// ```
    /// use redistore::KeyPair;
    ///
    /// let pairs = KeyPair::from_pairs(&["new-hash", "new-block", "old-hash"]);
    /// assert_eq!(pairs.len(), 2);
    /// assert!(pairs[0].block_key.is_some());
    /// assert!(pairs[1].block_key.is_none());
    /// ```
    #[must_use]
    pub fn from_pairs<K: AsRef<[u8]>>(keys: &[K]) -> Vec<Self> {
        keys.chunks(2)
            .map(|chunk| {
                let hash_key = chunk[0].as_ref().to_vec();
                let block_key = chunk
                    .get(1)
                    .map(|k| k.as_ref().to_vec())
                    .filter(|k| !k.is_empty());
                Self {
                    hash_key,
                    block_key,
                }
            })
            .collect()
    }

    fn to_cookie_key(&self) -> Result<Key, CookieError> {
        if self.hash_key.is_empty() {
            return Err(CookieError::InvalidKey("hash key is empty".to_string()));
        }

        // First half signs, second half encrypts
        let mut master = Vec::with_capacity(64);
        master.extend_from_slice(&Sha256::digest(&self.hash_key));
        master.extend_from_slice(&Sha256::digest(
            self.block_key.as_deref().unwrap_or(&self.hash_key),
        ));

        Key::try_from(master.as_slice()).map_err(|e| CookieError::InvalidKey(e.to_string()))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("hash_key", &"<redacted>")
            .field("encrypted", &self.block_key.is_some())
            .finish()
    }
}

#[derive(Clone)]
struct CodecKey {
    key: Key,
    encrypted: bool,
}

/// Encodes session ids into cookie tokens and verifies them back.
#[derive(Clone)]
pub struct CookieCodec {
    keys: Vec<CodecKey>,
    max_age: i64,
}

impl CookieCodec {
    /// Create a codec from one or more key pairs.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::NoKeys`] if `pairs` is empty, or
    /// [`CookieError::InvalidKey`] if a pair has an empty hash key.
    pub fn new(pairs: &[KeyPair]) -> Result<Self, CookieError> {
        if pairs.is_empty() {
            return Err(CookieError::NoKeys);
        }

        let keys = pairs
            .iter()
            .map(|pair| {
                Ok(CodecKey {
                    key: pair.to_cookie_key()?,
                    encrypted: pair.block_key.is_some(),
                })
            })
            .collect::<Result<Vec<_>, CookieError>>()?;

        Ok(Self {
            keys,
            max_age: DEFAULT_COOKIE_MAX_AGE,
        })
    }

    /// Maximum token age in seconds enforced on decode (`0` disables the check).
    #[must_use]
    pub const fn max_age(&self) -> i64 {
        self.max_age
    }

    /// Set the maximum token age in seconds.
    ///
    /// Non-positive values disable the check.
    pub const fn set_max_age(&mut self, seconds: i64) {
        self.max_age = if seconds > 0 { seconds } else { 0 };
    }

    /// Seal `session_id` into a token bound to the cookie `name`.
    ///
    /// # Errors
    ///
    /// Returns error if the token cannot be produced or exceeds
    /// [`MAX_TOKEN_LENGTH`].
    pub fn encode(&self, name: &str, session_id: &str) -> Result<String, CookieError> {
        let Some(primary) = self.keys.first() else {
            return Err(CookieError::NoKeys);
        };

        let payload = format!("{}|{session_id}", chrono::Utc::now().timestamp());
        let cookie = Cookie::new(name.to_string(), payload);

        let mut jar = CookieJar::new();
        if primary.encrypted {
            jar.private_mut(&primary.key).add(cookie);
        } else {
            jar.signed_mut(&primary.key).add(cookie);
        }

        let token = jar
            .get(name)
            .map(|c| c.value().to_string())
            .ok_or_else(|| CookieError::Encode("sealed cookie missing from jar".to_string()))?;

        if token.len() > MAX_TOKEN_LENGTH {
            return Err(CookieError::ValueTooLong {
                len: token.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        Ok(token)
    }

    /// Verify a token for cookie `name` and return the session id it carries.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::Unauthenticated`] if no key verifies the token,
    /// [`CookieError::Malformed`] if the verified plaintext is not a
    /// timestamped id, and [`CookieError::Expired`] if it is older than
    /// [`max_age`](Self::max_age).
    pub fn decode(&self, name: &str, token: &str) -> Result<String, CookieError> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(CookieError::ValueTooLong {
                len: token.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let jar = CookieJar::new();
        let plaintext = self
            .keys
            .iter()
            .find_map(|codec_key| {
                let sealed = Cookie::new(name.to_string(), token.to_string());
                if codec_key.encrypted {
                    jar.private(&codec_key.key).decrypt(sealed)
                } else {
                    jar.signed(&codec_key.key).verify(sealed)
                }
            })
            .ok_or(CookieError::Unauthenticated)?;

        let (issued_at, session_id) = plaintext
            .value()
            .split_once('|')
            .ok_or_else(|| CookieError::Malformed("missing timestamp separator".to_string()))?;

        let issued_at: i64 = issued_at
            .parse()
            .map_err(|_| CookieError::Malformed("invalid timestamp".to_string()))?;

        if session_id.is_empty() {
            return Err(CookieError::Malformed("empty session id".to_string()));
        }

        if self.max_age > 0 && issued_at < chrono::Utc::now().timestamp() - self.max_age {
            return Err(CookieError::Expired {
                issued_at,
                max_age: self.max_age,
            });
        }

        Ok(session_id.to_string())
    }
}

impl std::fmt::Debug for CookieCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCodec")
            .field("keys", &self.keys.len())
            .field("max_age", &self.max_age)
            .finish()
    }
}
