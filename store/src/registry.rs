//! Per-request session registry.
//!
//! Handlers often touch the same session from several places during one
//! request. The registry loads each named session at most once and hands out
//! the same instance on every lookup, then saves all of them together.

use crate::cache::SessionCache;
use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::store::SessionStore;
use http::HeaderMap;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

#[derive(Debug)]
struct Slot {
    session: Session,
    cookie_error: Option<SessionError>,
}

/// Sessions loaded during a single request.
///
/// # Example
///
/// ```no_run
/// use redistore::{SessionRegistry, SessionStore, Value};
/// use http::HeaderMap;
///
/// # async fn example(store: SessionStore, request_headers: HeaderMap) -> redistore::Result<()> {
/// let mut registry = SessionRegistry::new(&store, &request_headers);
///
/// registry.get("sess").await?.insert("step", Value::from(1));
/// registry.get("sess").await?.insert("done", Value::from(false));
///
/// let mut response_headers = HeaderMap::new();
/// registry.save_all(&mut response_headers).await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionRegistry<'a, C: SessionCache> {
    store: &'a SessionStore<C>,
    headers: &'a HeaderMap,
    sessions: HashMap<String, Slot>,
}

impl<'a, C: SessionCache> SessionRegistry<'a, C> {
    /// Create an empty registry for a request.
    #[must_use]
    pub fn new(store: &'a SessionStore<C>, headers: &'a HeaderMap) -> Self {
        Self {
            store,
            headers,
            sessions: HashMap::new(),
        }
    }

    /// Get the session `name`, loading it on first access.
    ///
    /// # Errors
    ///
    /// Returns the load error on first access; nothing is cached in that case
    /// and the next call retries.
    pub async fn get(&mut self, name: &str) -> Result<&mut Session> {
        let slot = match self.sessions.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let loaded = self.store.load(self.headers, name).await?;
                entry.insert(Slot {
                    session: loaded.session,
                    cookie_error: loaded.cookie_error,
                })
            }
        };

        Ok(&mut slot.session)
    }

    /// Why the request cookie of `name` was rejected, if it was loaded and rejected.
    #[must_use]
    pub fn cookie_error(&self, name: &str) -> Option<&SessionError> {
        self.sessions
            .get(name)
            .and_then(|slot| slot.cookie_error.as_ref())
    }

    /// Number of sessions loaded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Save every loaded session, appending one `Set-Cookie` header each.
    ///
    /// # Errors
    ///
    /// Every session is attempted; the first failure is returned.
    pub async fn save_all(&mut self, headers: &mut HeaderMap) -> Result<()> {
        let mut first_error = None;

        for (name, slot) in &mut self.sessions {
            if let Err(e) = self.store.save(&mut slot.session, headers).await {
                tracing::warn!(session_name = %name, error = %e, "Failed to save session");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
