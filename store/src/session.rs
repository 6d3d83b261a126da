//! Per-request session state and the cookie options it is issued with.

use crate::value::{Key, Value, Values};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

/// Key under which flash messages are stored unless another one is given.
pub const DEFAULT_FLASH_KEY: &str = "_flash";

/// Attributes of the session cookie.
///
/// `max_age` drives both the cookie and the cache entry:
///
/// - `Some(n)` with `n > 0`: cookie lives `n` seconds, cache entry too
/// - `Some(n)` with `n <= 0`: the session is deleted and the cookie expired
/// - `None`: browser-session cookie, cache entry uses the store default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Cookie `Path`
    pub path: Option<String>,
    /// Cookie `Domain`
    pub domain: Option<String>,
    /// Lifetime in seconds
    pub max_age: Option<i64>,
    /// Cookie `Secure` flag
    pub secure: bool,
    /// Cookie `HttpOnly` flag
    pub http_only: bool,
    /// Cookie `SameSite` policy
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// Default cookie lifetime: 30 days.
    pub const DEFAULT_MAX_AGE: i64 = 86_400 * 30;

    /// Returns `true` if these options request deletion of the session.
    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        matches!(self.max_age, Some(age) if age <= 0)
    }

    /// Render a cookie named `name` carrying `value` with these attributes.
    #[must_use]
    pub fn to_cookie(&self, name: &str, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name.to_string(), value);

        if let Some(path) = &self.path {
            cookie.set_path(path.clone());
        }
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }

        match self.max_age {
            Some(age) if age > 0 => {
                let lifetime = Duration::seconds(age);
                cookie.set_max_age(lifetime);
                // Past the representable calendar only Max-Age is sent
                if let Some(expires) = OffsetDateTime::now_utc().checked_add(lifetime) {
                    cookie.set_expires(expires);
                }
            }
            Some(_) => {
                cookie.set_max_age(Duration::ZERO);
                cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
            }
            None => {}
        }

        cookie.set_secure(self.secure);
        cookie.set_http_only(self.http_only);
        if let Some(same_site) = self.same_site {
            cookie.set_same_site(same_site);
        }

        cookie
    }
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            max_age: Some(Self::DEFAULT_MAX_AGE),
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

/// A named session.
///
/// Created by the store, owned by the request that loaded it. The id stays
/// empty until the first save assigns one.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    name: String,
    id: String,
    values: Values,
    options: CookieOptions,
    is_new: bool,
}

impl Session {
    /// Create a new, empty session.
    #[must_use]
    pub fn new(name: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            values: Values::new(),
            options,
            is_new: true,
        }
    }

    /// Cookie name of this session.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session id, empty until first saved.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    /// Whether the session was created during this request.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    pub(crate) const fn mark_loaded(&mut self) {
        self.is_new = false;
    }

    /// Cookie options this session will be saved with.
    #[must_use]
    pub const fn options(&self) -> &CookieOptions {
        &self.options
    }

    /// Mutable cookie options, e.g. to set `max_age` to `Some(-1)` on logout.
    pub const fn options_mut(&mut self) -> &mut CookieOptions {
        &mut self.options
    }

    /// All stored values.
    #[must_use]
    pub const fn values(&self) -> &Values {
        &self.values
    }

    /// Mutable access to all stored values.
    pub const fn values_mut(&mut self) -> &mut Values {
        &mut self.values
    }

    /// Get a value.
    #[must_use]
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.values.get(&key.into())
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: impl Into<Key>) -> Option<Value> {
        self.values.remove(&key.into())
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Queue a flash message under the default flash key.
    pub fn add_flash(&mut self, value: impl Into<Value>) {
        self.add_flash_to(DEFAULT_FLASH_KEY, value);
    }

    /// Queue a flash message under `key`.
    ///
    /// A non-list value already stored under `key` is replaced.
    pub fn add_flash_to(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        let slot = self
            .values
            .entry(key.into())
            .or_insert_with(|| Value::List(Vec::new()));

        match slot {
            Value::List(flashes) => flashes.push(value.into()),
            other => *other = Value::List(vec![value.into()]),
        }
    }

    /// Take every flash message queued under the default flash key.
    pub fn take_flashes(&mut self) -> Vec<Value> {
        self.take_flashes_from(DEFAULT_FLASH_KEY)
    }

    /// Take every flash message queued under `key`.
    pub fn take_flashes_from(&mut self, key: impl Into<Key>) -> Vec<Value> {
        match self.values.remove(&key.into()) {
            Some(Value::List(flashes)) => flashes,
            Some(other) => vec![other],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new("sess", CookieOptions::default());
        assert_eq!(session.name(), "sess");
        assert!(session.id().is_empty());
        assert!(session.is_new());
        assert!(session.values().is_empty());
    }

    #[test]
    fn test_values() {
        let mut session = Session::new("sess", CookieOptions::default());
        session.insert("a", 1);
        session.insert(7_i64, "seven");

        assert_eq!(session.get("a"), Some(&Value::Int(1)));
        assert_eq!(session.get(7_i64), Some(&Value::from("seven")));
        assert_eq!(session.remove("a"), Some(Value::Int(1)));

        session.clear();
        assert!(session.values().is_empty());
    }

    #[test]
    fn test_flashes() {
        let mut session = Session::new("sess", CookieOptions::default());
        session.add_flash("saved");
        session.add_flash("again");
        session.add_flash_to("errors", "oops");

        assert_eq!(session.take_flashes(), vec![Value::from("saved"), Value::from("again")]);
        assert!(session.take_flashes().is_empty());
        assert_eq!(session.take_flashes_from("errors"), vec![Value::from("oops")]);
    }

    #[test]
    fn test_positive_max_age_renders_expiry() {
        let options = CookieOptions {
            max_age: Some(60),
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Lax),
            ..CookieOptions::default()
        };
        let cookie = options.to_cookie("sess", "token".to_string());

        assert_eq!(cookie.max_age(), Some(Duration::seconds(60)));
        assert!(cookie.expires_datetime().is_some_and(|at| at > OffsetDateTime::now_utc()));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_huge_max_age_omits_expires() {
        let options = CookieOptions {
            max_age: Some(400_000_000_000),
            ..CookieOptions::default()
        };
        let cookie = options.to_cookie("sess", "token".to_string());

        assert_eq!(cookie.max_age(), Some(Duration::seconds(400_000_000_000)));
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn test_deletion_renders_expired_cookie() {
        for age in [0, -1] {
            let options = CookieOptions {
                max_age: Some(age),
                ..CookieOptions::default()
            };
            assert!(options.is_deletion());

            let cookie = options.to_cookie("sess", String::new());
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        }
    }

    #[test]
    fn test_unset_max_age_is_browser_session_cookie() {
        let options = CookieOptions {
            max_age: None,
            domain: Some("example.com".to_string()),
            ..CookieOptions::default()
        };
        let cookie = options.to_cookie("sess", "token".to_string());

        assert!(!options.is_deletion());
        assert_eq!(cookie.max_age(), None);
        assert!(cookie.expires().is_none());
        assert_eq!(cookie.domain(), Some("example.com"));
    }
}
