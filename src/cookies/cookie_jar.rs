//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! A **cookie jar** holds the first-party cookies the client can read and write
//! for the page it runs in. It is the key/value store with per-entry expiration
//! that backs the [`LocalCache`](crate::cache::LocalCache).
//!
//! This module defines the [`CookieJar`] trait and a reference implementation,
//! [`DefaultCookieJar`], which stores cookies **in memory only**.
//!
//! ## Notes
//! - Writing a cookie whose expiration lies in the past removes it.
//! - Expired cookies are never returned; they are dropped lazily on the next write.
//! - This module is **not** internally synchronized. Use it via a
//!   `CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>`.
use crate::cookies::{Cookie, CookieJarHandle};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;

/// A cookie jar keeps the cookies of one page origin.
pub trait CookieJar: Send + Sync {
    /// Returns the cookie named `name` unless it is missing or expired.
    fn get(&self, name: &str) -> Option<Cookie>;

    /// Stores `cookie`, replacing any cookie with the same name.
    ///
    /// A cookie that is already expired removes the existing entry instead.
    fn set(&mut self, cookie: Cookie) -> Result<()>;

    /// Removes a single cookie.
    fn remove(&mut self, name: &str) -> Result<()>;

    /// Removes all cookies from the jar.
    fn clear(&mut self) -> Result<()>;

    /// Retrieves all live cookies. Primarily intended for diagnostics/inspection.
    fn get_all_cookies(&self) -> Vec<Cookie>;
}

/// Default cookie jar, in-memory only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultCookieJar {
    /// Cookies keyed by name.
    pub entries: HashMap<String, Cookie>,
}

impl DefaultCookieJar {
    /// Creates an empty in-memory cookie jar.
    pub fn new() -> Self {
        DefaultCookieJar {
            entries: HashMap::new(),
        }
    }

    /// Wraps the jar into a shareable handle.
    pub fn into_handle(self) -> CookieJarHandle {
        Arc::new(RwLock::new(self))
    }

    fn purge_expired(&mut self, now: OffsetDateTime) {
        self.entries.retain(|_, c| !c.is_expired(now));
    }
}

impl CookieJar for DefaultCookieJar {
    fn get(&self, name: &str) -> Option<Cookie> {
        let now = OffsetDateTime::now_utc();
        self.entries
            .get(name)
            .filter(|c| !c.is_expired(now))
            .cloned()
    }

    fn set(&mut self, cookie: Cookie) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        self.purge_expired(now);

        if cookie.is_expired(now) {
            self.entries.remove(&cookie.name);
        } else {
            self.entries.insert(cookie.name.clone(), cookie);
        }
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.entries.remove(name);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn get_all_cookies(&self) -> Vec<Cookie> {
        let now = OffsetDateTime::now_utc();
        let mut all: Vec<Cookie> = self
            .entries
            .values()
            .filter(|c| !c.is_expired(now))
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn later() -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::days(1)
    }

    #[test]
    fn set_get_overwrite() {
        let mut jar = DefaultCookieJar::new();
        assert!(jar.get("a").is_none());

        jar.set(Cookie::new("a", "1", later())).unwrap();
        assert_eq!(jar.get("a").unwrap().value, "1");

        jar.set(Cookie::new("a", "2", later())).unwrap();
        assert_eq!(jar.get("a").unwrap().value, "2");
        assert_eq!(jar.get_all_cookies().len(), 1);
    }

    #[test]
    fn expired_write_removes_entry() {
        let mut jar = DefaultCookieJar::new();
        jar.set(Cookie::new("a", "1", later())).unwrap();
        jar.set(Cookie::expired("a")).unwrap();
        assert!(jar.get("a").is_none());
        assert!(jar.entries.is_empty());
    }

    #[test]
    fn expired_entries_are_invisible() {
        let mut jar = DefaultCookieJar::new();
        jar.entries.insert(
            "old".into(),
            Cookie::new("old", "x", OffsetDateTime::now_utc() - Duration::seconds(5)),
        );
        assert!(jar.get("old").is_none());
        assert!(jar.get_all_cookies().is_empty());

        jar.set(Cookie::new("b", "1", later())).unwrap();
        assert!(!jar.entries.contains_key("old"));
    }

    #[test]
    fn session_cookie_never_expires() {
        let mut jar = DefaultCookieJar::new();
        jar.set(Cookie { name: "s".into(), value: "v".into(), expires: None }).unwrap();
        assert_eq!(jar.get("s").unwrap().value, "v");
    }

    #[test]
    fn remove_and_clear() {
        let mut jar = DefaultCookieJar::new();
        jar.set(Cookie::new("a", "1", later())).unwrap();
        jar.set(Cookie::new("b", "2", later())).unwrap();
        jar.remove("a").unwrap();
        assert!(jar.get("a").is_none());
        jar.clear().unwrap();
        assert!(jar.get_all_cookies().is_empty());
    }
}
