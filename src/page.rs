//! Browser capabilities the client needs from its host page.
//!
//! The resolution flows never touch a real address bar. They go through two
//! small traits instead:
//!
//! - [`Location`] reads the current page URL and rewrites it in place, the way
//!   `history.pushState` does (no reload).
//! - [`Navigator`] leaves the page for another URL. Navigation is terminal for
//!   the current page: the client never runs code that depends on what happens
//!   after it.
//!
//! [`SimulatedPage`] implements both for hosts without a browser (the CLI, tests).

use std::sync::{PoisonError, RwLock};
use url::Url;

pub trait Location: Send + Sync {
    /// Current page URL, including query string and fragment.
    fn href(&self) -> Url;

    /// Replaces the visible URL without reloading the page.
    fn replace_state(&self, url: Url);
}

pub trait Navigator: Send + Sync {
    /// Leaves the current page for `url`.
    fn navigate(&self, url: &Url);
}

/// An in-process page: keeps the current URL and records every navigation.
#[derive(Debug)]
pub struct SimulatedPage {
    url: RwLock<Url>,
    navigations: RwLock<Vec<Url>>,
}

impl SimulatedPage {
    pub fn new(url: Url) -> Self {
        Self {
            url: RwLock::new(url),
            navigations: RwLock::new(Vec::new()),
        }
    }

    /// All navigation targets requested so far, oldest first.
    pub fn navigations(&self) -> Vec<Url> {
        self.navigations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_navigation(&self) -> Option<Url> {
        self.navigations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Location for SimulatedPage {
    fn href(&self) -> Url {
        self.url.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace_state(&self, url: Url) {
        *self.url.write().unwrap_or_else(PoisonError::into_inner) = url;
    }
}

impl Navigator for SimulatedPage {
    fn navigate(&self, url: &Url) {
        log::info!("Navigating to {}", url);
        self.navigations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());
    }
}
