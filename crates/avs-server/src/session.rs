//! Server-side sessions
//!
//! A session is an opaque random id handed out as an `HttpOnly` cookie and
//! mapped to the signed-in user's profile. Entries expire after the
//! configured time-to-live; logout invalidates them immediately. The store
//! holds at most [`MAX_SESSIONS`] entries, and past that the least recently
//! used sessions are evicted early (logged at `warn`).

use crate::config::SessionSection;
use avs_core::{Actor, UserProfile};
use moka::future::Cache;
use moka::notification::RemovalCause;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Capacity of the session store
pub const MAX_SESSIONS: u64 = 100_000;

fn log_eviction(_id: Arc<String>, profile: UserProfile, cause: RemovalCause) {
    if cause == RemovalCause::Size {
        warn!(user = %profile.id, "Session evicted before expiry, store at capacity");
    }
}

/// Active sessions keyed by session id
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Cache<String, UserProfile>,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
}

impl SessionStore {
    /// Create store with cookie settings
    #[must_use]
    pub fn new(section: &SessionSection, secure: bool) -> Self {
        Self::with_capacity(section, secure, MAX_SESSIONS)
    }

    fn with_capacity(section: &SessionSection, secure: bool, capacity: u64) -> Self {
        let ttl = section.ttl();
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .eviction_listener(log_eviction)
                .build(),
            cookie_name: section.cookie_name.clone(),
            ttl,
            secure,
        }
    }

    /// Start a session, returning its id
    pub async fn create(&self, profile: UserProfile) -> String {
        let id = hex::encode(rand::random::<[u8; 32]>());
        self.inner.insert(id.clone(), profile).await;
        id
    }

    /// Profile behind a session id
    #[inline]
    pub async fn get(&self, id: &str) -> Option<UserProfile> {
        self.inner.get(id).await
    }

    /// Actor behind a session id
    pub async fn actor(&self, id: &str) -> Option<Actor> {
        self.get(id).await.map(|profile| Actor::from(&profile))
    }

    /// End a session
    #[inline]
    pub async fn destroy(&self, id: &str) {
        self.inner.invalidate(id).await;
    }

    /// Cookie name
    #[inline]
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Find this store's session id in a `Cookie` header
    #[must_use]
    pub fn session_id<'a>(&self, cookie_header: &'a str) -> Option<&'a str> {
        cookie_header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.cookie_name && !value.is_empty()).then_some(value)
        })
    }

    /// `Set-Cookie` value for a new session
    #[must_use]
    pub fn set_cookie(&self, id: &str) -> String {
        self.cookie(id, self.ttl.as_secs())
    }

    /// `Set-Cookie` value that expires the session cookie
    #[must_use]
    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}",
            self.cookie_name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Approximate number of live sessions
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Whether no session is live
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avs_core::{Role, UserId};
    use pretty_assertions::assert_eq;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new(),
            email: "user@example.com".into(),
            name: None,
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_get_destroy() {
        let store = SessionStore::new(&SessionSection::default(), false);
        let user = profile();
        let id = store.create(user.clone()).await;
        assert_eq!(id.len(), 64);

        assert_eq!(store.get(&id).await, Some(user.clone()));
        assert_eq!(store.actor(&id).await, Some(Actor::user(user.id)));

        store.destroy(&id).await;
        assert_eq!(store.get(&id).await, None);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = SessionStore::new(&SessionSection::default(), false);
        let a = store.create(profile()).await;
        let b = store.create(profile()).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn capacity_evicts_older_sessions() {
        let store = SessionStore::with_capacity(&SessionSection::default(), false, 1);
        assert!(store.is_empty());

        store.create(profile()).await;
        store.create(profile()).await;
        store.inner.run_pending_tasks().await;
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let store = SessionStore::new(&SessionSection::default(), false);
        assert_eq!(store.session_id("theme=dark; avs.sid=abc123; x=y"), Some("abc123"));
        assert_eq!(store.session_id("avs.sid="), None);
        assert_eq!(store.session_id("other.sid=abc"), None);
    }

    #[test]
    fn cookie_attributes() {
        let store = SessionStore::new(&SessionSection::default(), false);
        assert_eq!(
            store.set_cookie("abc"),
            "avs.sid=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=604800"
        );

        let secure = SessionStore::new(&SessionSection::default(), true);
        assert!(secure.set_cookie("abc").ends_with("; Secure"));
        assert!(secure.clear_cookie().starts_with("avs.sid=; "));
        assert!(secure.clear_cookie().contains("Max-Age=0"));
    }
}
