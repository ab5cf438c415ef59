//! Cookie core types.
//!
//! This module defines the **type-erased handle** used throughout the client
//! and the serializable [`Cookie`] data structure.
//!
//! # Concurrency model
//! - [`CookieJarHandle`] is `Arc<RwLock<dyn CookieJar + Send + Sync>>`.
//!   Callers take a **read lock** for lookups and a **write lock** for mutations.
//!
//! The [`Cookie`] struct can be (de)serialized via `serde`; the expiration is
//! written as RFC 3339.
//!
//! ```rust,no_run
//! use paf_client::cookies::Cookie;
//! use time::{Duration, OffsetDateTime};
//!
//! let c = Cookie::new("paf_identifiers", "NOT_PARTICIPATING", OffsetDateTime::now_utc() + Duration::days(90));
//! assert!(!c.is_expired(OffsetDateTime::now_utc()));
//! ```

use crate::cookies::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;

/// A handle to a cookie jar trait.
///
/// This is a reference-counted, read/write-locked pointer to a type-erased
/// [`CookieJar`].
pub type CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>;

/// A first-party cookie as seen by page script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value.
    pub value: String,

    /// Expiration timestamp. Session cookies have `None`.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,
}

impl Cookie {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V, expires: OffsetDateTime) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: Some(expires),
        }
    }

    /// A cookie with an empty value that expired at the epoch. Writing it removes
    /// the cookie, the same way `document.cookie` deletes entries.
    pub fn expired<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            expires: Some(OffsetDateTime::UNIX_EPOCH),
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}
