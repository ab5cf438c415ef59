//! Local cache of identifiers and preferences.
//!
//! The cache is made of two cookie slots, `identifiers` and `preferences`, that
//! are always written together. Each slot holds either a JSON value or one of two
//! markers:
//!
//! | Cookie value        | [`CacheEntry`]                  |
//! |---------------------|---------------------------------|
//! | JSON                | `Participating(json)`           |
//! | `NOT_PARTICIPATING` | `NotParticipating`              |
//! | `REDIRECT_NEEDED`   | `RedirectNeeded`                |
//! | (no cookie)         | `None`, i.e. unknown/cold start |
//!
//! [`LocalCache::load`] folds both slots into a [`CachedValues`] answer for the
//! read flow. A slot that is neither a marker nor valid JSON makes the whole
//! cache "unknown" so the next successful write heals it.

use crate::config::ClientConfig;
use crate::cookies::{Cookie, CookieJarHandle};
use crate::errors::ClientError;
use crate::model::{Identifier, IdsAndOptionalPreferences, Preferences};
use std::fmt::Display;
use std::sync::PoisonError;
use std::time::Duration;
use time::OffsetDateTime;

pub const NOT_PARTICIPATING: &str = "NOT_PARTICIPATING";
pub const REDIRECT_NEEDED: &str = "REDIRECT_NEEDED";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Slot {
    Identifiers,
    Preferences,
}

impl Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Identifiers => write!(f, "identifiers"),
            Slot::Preferences => write!(f, "preferences"),
        }
    }
}

/// Status tag of a populated slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Participating,
    NotParticipating,
    RedirectNeeded,
}

/// Raw content of one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Participating(String),
    NotParticipating,
    RedirectNeeded,
}

impl CacheEntry {
    pub fn from_cookie_value(raw: &str) -> Self {
        match raw {
            NOT_PARTICIPATING => CacheEntry::NotParticipating,
            REDIRECT_NEEDED => CacheEntry::RedirectNeeded,
            json => CacheEntry::Participating(json.to_string()),
        }
    }

    pub fn to_cookie_value(&self) -> &str {
        match self {
            CacheEntry::Participating(json) => json,
            CacheEntry::NotParticipating => NOT_PARTICIPATING,
            CacheEntry::RedirectNeeded => REDIRECT_NEEDED,
        }
    }

    pub fn status(&self) -> CacheStatus {
        match self {
            CacheEntry::Participating(_) => CacheStatus::Participating,
            CacheEntry::NotParticipating => CacheStatus::NotParticipating,
            CacheEntry::RedirectNeeded => CacheStatus::RedirectNeeded,
        }
    }
}

/// What the cache knows about the user, as seen by the read flow.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValues {
    /// Nothing usable: missing, half-written, mixed with a redirect marker, or malformed.
    Unknown,
    /// A redirect was deferred on a previous page load.
    RedirectNeeded,
    /// Both slots hold values (participating or not).
    Known(IdsAndOptionalPreferences),
}

pub struct LocalCache {
    jar: CookieJarHandle,
    identifiers_cookie: String,
    preferences_cookie: String,
    ttl: Duration,
}

impl LocalCache {
    pub fn new(jar: CookieJarHandle, config: &ClientConfig) -> Self {
        Self {
            jar,
            identifiers_cookie: config.identifiers_cookie.clone(),
            preferences_cookie: config.preferences_cookie.clone(),
            ttl: config.cookie_ttl,
        }
    }

    pub fn jar(&self) -> &CookieJarHandle {
        &self.jar
    }

    fn cookie_name(&self, slot: Slot) -> &str {
        match slot {
            Slot::Identifiers => &self.identifiers_cookie,
            Slot::Preferences => &self.preferences_cookie,
        }
    }

    pub fn read(&self, slot: Slot) -> Option<CacheEntry> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        jar.get(self.cookie_name(slot))
            .filter(|c| !c.value.is_empty())
            .map(|c| CacheEntry::from_cookie_value(&c.value))
    }

    /// Overwrites `slot` unconditionally; the entry lives for the configured TTL.
    pub fn write(&self, slot: Slot, entry: &CacheEntry) -> Result<(), ClientError> {
        let expires = OffsetDateTime::now_utc() + self.ttl;
        let cookie = Cookie::new(self.cookie_name(slot), entry.to_cookie_value(), expires);

        log::debug!("Save {} value: {}", slot, entry.to_cookie_value());
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        jar.set(cookie)?;
        Ok(())
    }

    /// Writes an empty, already expired value into `slot`.
    pub fn clear(&self, slot: Slot) -> Result<(), ClientError> {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        jar.set(Cookie::expired(self.cookie_name(slot)))?;
        Ok(())
    }

    /// Clears both slots, attempting the second even if the first fails.
    pub fn clear_all(&self) -> Result<(), ClientError> {
        let ids = self.clear(Slot::Identifiers);
        let prefs = self.clear(Slot::Preferences);
        ids.and(prefs)
    }

    /// Reads both slots and decides what the read flow can rely on.
    pub fn load(&self) -> CachedValues {
        let (ids, prefs) = match (self.read(Slot::Identifiers), self.read(Slot::Preferences)) {
            (Some(ids), Some(prefs)) => (ids, prefs),
            _ => return CachedValues::Unknown,
        };

        match (ids.status(), prefs.status()) {
            (CacheStatus::RedirectNeeded, CacheStatus::RedirectNeeded) => return CachedValues::RedirectNeeded,
            (CacheStatus::RedirectNeeded, _) | (_, CacheStatus::RedirectNeeded) => {
                log::warn!("Only one cache slot asks for a redirect, ignoring cache");
                return CachedValues::Unknown;
            }
            _ => {}
        }

        match decode(&ids, &prefs) {
            Ok(values) => CachedValues::Known(values),
            Err(e) => {
                log::warn!("Malformed cached value ({}), treating cache as empty", e);
                CachedValues::Unknown
            }
        }
    }

    /// Caches the persisted identifiers and the preferences of `values`.
    ///
    /// Slots without data are written as `NOT_PARTICIPATING`.
    pub fn store(&self, values: &IdsAndOptionalPreferences) -> Result<(), ClientError> {
        let persisted = values.persisted_identifiers();
        log::info!(
            "Operator returned value for identifiers: {}",
            if persisted.is_empty() { "NO" } else { "YES" }
        );
        log::info!(
            "Operator returned value for preferences: {}",
            if values.preferences.is_some() { "YES" } else { "NO" }
        );

        let ids = if persisted.is_empty() {
            CacheEntry::NotParticipating
        } else {
            CacheEntry::Participating(serde_json::to_string(&persisted)?)
        };
        let prefs = match &values.preferences {
            Some(p) => CacheEntry::Participating(serde_json::to_string(p)?),
            None => CacheEntry::NotParticipating,
        };

        self.write_both(&ids, &prefs)
    }

    pub fn store_not_participating(&self) -> Result<(), ClientError> {
        self.write_both(&CacheEntry::NotParticipating, &CacheEntry::NotParticipating)
    }

    pub fn store_redirect_needed(&self) -> Result<(), ClientError> {
        self.write_both(&CacheEntry::RedirectNeeded, &CacheEntry::RedirectNeeded)
    }

    /// Writes both slots. On failure both are cleared so a half-written pair is
    /// never read back as one user's values.
    fn write_both(&self, ids: &CacheEntry, prefs: &CacheEntry) -> Result<(), ClientError> {
        let written = self
            .write(Slot::Identifiers, ids)
            .and_then(|_| self.write(Slot::Preferences, prefs));

        if let Err(e) = written {
            log::warn!("Cache write failed ({}), clearing both slots", e);
            if let Err(clear_err) = self.clear_all() {
                log::warn!("Clearing cache after failed write also failed: {}", clear_err);
            }
            return Err(e);
        }
        Ok(())
    }
}

fn decode(ids: &CacheEntry, prefs: &CacheEntry) -> Result<IdsAndOptionalPreferences, serde_json::Error> {
    let identifiers = match ids {
        CacheEntry::Participating(json) => serde_json::from_str::<Vec<Identifier>>(json)?,
        _ => Vec::new(),
    };
    let preferences = match prefs {
        CacheEntry::Participating(json) => Some(serde_json::from_str::<Preferences>(json)?),
        _ => None,
    };

    Ok(IdsAndOptionalPreferences { identifiers, preferences })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::{CookieJar, DefaultCookieJar};
    use serde_json::json;
    use std::sync::{Arc, RwLock};

    /// In-memory jar whose writes to one cookie fail once `broken` is set.
    struct BrokenSlotJar {
        inner: DefaultCookieJar,
        name: &'static str,
        broken: bool,
    }

    impl CookieJar for BrokenSlotJar {
        fn get(&self, name: &str) -> Option<Cookie> {
            self.inner.get(name)
        }

        fn set(&mut self, cookie: Cookie) -> anyhow::Result<()> {
            if self.broken && cookie.name == self.name {
                anyhow::bail!("disk full");
            }
            self.inner.set(cookie)
        }

        fn remove(&mut self, name: &str) -> anyhow::Result<()> {
            self.inner.remove(name)
        }

        fn clear(&mut self) -> anyhow::Result<()> {
            self.inner.clear()
        }

        fn get_all_cookies(&self) -> Vec<Cookie> {
            self.inner.get_all_cookies()
        }
    }

    fn cache() -> LocalCache {
        LocalCache::new(DefaultCookieJar::new().into_handle(), &ClientConfig::default())
    }

    fn raw_set(cache: &LocalCache, name: &str, value: &str) {
        let mut jar = cache.jar().write().unwrap();
        jar.set(Cookie::new(name, value, OffsetDateTime::now_utc() + time::Duration::days(1)))
            .unwrap();
    }

    fn sample() -> IdsAndOptionalPreferences {
        let mut ephemeral = Identifier::new("tmp");
        ephemeral.persisted = Some(false);
        IdsAndOptionalPreferences {
            identifiers: vec![Identifier::new("abc"), ephemeral],
            preferences: Some(Preferences(json!({"data": {"use_browsing_for_personalization": true}}))),
        }
    }

    #[test]
    fn empty_cache_is_unknown() {
        assert_eq!(cache().load(), CachedValues::Unknown);
    }

    #[test]
    fn store_keeps_only_persisted_identifiers() {
        let cache = cache();
        cache.store(&sample()).unwrap();

        match cache.load() {
            CachedValues::Known(v) => {
                assert_eq!(v.identifiers, vec![Identifier::new("abc")]);
                assert_eq!(v.preferences, sample().preferences);
            }
            other => panic!("expected known values, got {:?}", other),
        }
    }

    #[test]
    fn no_persisted_identifier_is_not_participating() {
        let cache = cache();
        cache.store(&IdsAndOptionalPreferences::default()).unwrap();

        assert_eq!(cache.read(Slot::Identifiers), Some(CacheEntry::NotParticipating));
        assert_eq!(cache.read(Slot::Preferences), Some(CacheEntry::NotParticipating));
        assert_eq!(cache.load(), CachedValues::Known(IdsAndOptionalPreferences::not_participating()));
    }

    #[test]
    fn redirect_needed_in_both_slots() {
        let cache = cache();
        cache.store_redirect_needed().unwrap();
        assert_eq!(cache.load(), CachedValues::RedirectNeeded);
    }

    #[test]
    fn half_written_or_mixed_cache_is_unknown() {
        let cache = cache();
        cache.write(Slot::Identifiers, &CacheEntry::NotParticipating).unwrap();
        assert_eq!(cache.load(), CachedValues::Unknown);

        cache.write(Slot::Preferences, &CacheEntry::RedirectNeeded).unwrap();
        assert_eq!(cache.load(), CachedValues::Unknown);
    }

    #[test]
    fn malformed_value_is_unknown() {
        let cache = cache();
        raw_set(&cache, "paf_identifiers", "{not json");
        raw_set(&cache, "paf_preferences", NOT_PARTICIPATING);
        assert_eq!(cache.load(), CachedValues::Unknown);
    }

    #[test]
    fn clear_removes_both_slots() {
        let cache = cache();
        cache.store(&sample()).unwrap();
        cache.clear_all().unwrap();

        assert!(cache.read(Slot::Identifiers).is_none());
        assert!(cache.read(Slot::Preferences).is_none());
        assert!(cache.jar().read().unwrap().get_all_cookies().is_empty());
    }

    #[test]
    fn failed_preferences_write_never_mixes_users() {
        let jar = Arc::new(RwLock::new(BrokenSlotJar {
            inner: DefaultCookieJar::new(),
            name: "paf_preferences",
            broken: false,
        }));
        let cache = LocalCache::new(jar.clone(), &ClientConfig::default());

        cache
            .store(&IdsAndOptionalPreferences {
                identifiers: vec![Identifier::new("A")],
                preferences: Some(Preferences(json!({"who": "A"}))),
            })
            .unwrap();

        jar.write().unwrap().broken = true;
        let err = cache
            .store(&IdsAndOptionalPreferences {
                identifiers: vec![Identifier::new("B")],
                preferences: Some(Preferences(json!({"who": "B"}))),
            })
            .unwrap_err();

        assert!(matches!(err, ClientError::Storage(_)));
        assert!(cache.read(Slot::Identifiers).is_none());
        assert_eq!(cache.load(), CachedValues::Unknown);
    }

    #[test]
    fn failed_marker_write_clears_first_slot() {
        let jar = Arc::new(RwLock::new(BrokenSlotJar {
            inner: DefaultCookieJar::new(),
            name: "paf_preferences",
            broken: true,
        }));
        let cache = LocalCache::new(jar, &ClientConfig::default());

        assert!(cache.store_redirect_needed().is_err());
        assert!(cache.read(Slot::Identifiers).is_none());
        assert_eq!(cache.load(), CachedValues::Unknown);
    }

    #[test]
    fn entry_markers_roundtrip_through_cookie_value() {
        assert_eq!(CacheEntry::from_cookie_value(NOT_PARTICIPATING), CacheEntry::NotParticipating);
        assert_eq!(CacheEntry::from_cookie_value(REDIRECT_NEEDED).status(), CacheStatus::RedirectNeeded);
        assert_eq!(CacheEntry::Participating("[]".into()).to_cookie_value(), "[]");
    }
}
