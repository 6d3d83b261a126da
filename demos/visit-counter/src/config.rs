//! Demo configuration loaded from environment variables with defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Demo server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Redis connection URL
    pub redis_url: String,
    /// Key used to authenticate session cookies
    pub session_secret: String,
    /// Key used to encrypt session cookies (signing only when absent)
    pub session_block_key: Option<String>,
    /// Cache key prefix
    pub key_prefix: String,
    /// Maximum serialized session size in bytes (0 = unlimited)
    pub max_length: usize,
    /// Address to listen on
    pub bind_addr: String,
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            session_secret: lookup("SESSION_SECRET")
                .unwrap_or_else(|| "change-me-in-production".to_string()),
            session_block_key: lookup("SESSION_BLOCK_KEY").filter(|key| !key.is_empty()),
            key_prefix: lookup("SESSION_KEY_PREFIX").unwrap_or_else(|| "visits_".to_string()),
            max_length: lookup("SESSION_MAX_LENGTH")
                .and_then(|s| s.parse().ok())
                .unwrap_or(4096),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
        }
    }

    /// Session keys in hash/block order.
    #[must_use]
    pub fn key_pairs(&self) -> Vec<String> {
        let mut keys = vec![self.session_secret.clone()];
        keys.extend(self.session_block_key.clone());
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.max_length, 4096);
        assert_eq!(config.key_pairs().len(), 1);
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            ("SESSION_BLOCK_KEY", "block"),
            ("SESSION_MAX_LENGTH", "0"),
            ("BIND_ADDR", "0.0.0.0:8080"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.max_length, 0);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.key_pairs(), vec!["change-me-in-production", "block"]);
    }

    #[test]
    fn test_unparsable_length_falls_back() {
        let config = Config::from_lookup(|key| (key == "SESSION_MAX_LENGTH").then(|| "lots".to_string()));
        assert_eq!(config.max_length, 4096);
    }
}
