//! Page-lifetime state shared by the read and write flows.
//!
//! A [`PageSession`] lives exactly as long as one page load. It carries the
//! third-party cookie verdict, which is recorded by the first flow that
//! discovers it and is authoritative until the page goes away.
//!
//! The write flow trusts whatever verdict is present. It is only accurate when
//! a read ran earlier on the same page; an unknown verdict makes writes take the
//! redirect path.

use std::fmt::Display;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// A unique identifier for a page session, used to correlate log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ThirdPartyCookies {
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

impl ThirdPartyCookies {
    pub fn from_supported(supported: bool) -> Self {
        if supported {
            ThirdPartyCookies::Supported
        } else {
            ThirdPartyCookies::Unsupported
        }
    }
}

#[derive(Debug, Default)]
pub struct PageSession {
    id: SessionId,
    third_party: Mutex<ThirdPartyCookies>,
}

impl PageSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn third_party_cookies(&self) -> ThirdPartyCookies {
        *self.third_party.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the verdict unless one is already known.
    ///
    /// Returns the verdict in effect afterwards.
    pub fn record_third_party_cookies(&self, verdict: ThirdPartyCookies) -> ThirdPartyCookies {
        let mut current = self.third_party.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *current;
        match previous {
            ThirdPartyCookies::Unknown => {
                log::debug!("[{}] Third-party cookies: {:?}", self.id, verdict);
                *current = verdict;
            }
            known if known != verdict && verdict != ThirdPartyCookies::Unknown => {
                log::warn!(
                    "[{}] Ignoring third-party cookie verdict {:?}, already {:?} for this page",
                    self.id,
                    verdict,
                    known
                );
            }
            _ => {}
        }
        *current
    }
}
