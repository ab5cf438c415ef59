//! JSON-backed cookie jar.
//!
//! `PersistentCookieJar` keeps its cookies in memory and writes a snapshot of
//! the whole jar to a single JSON file after **every** mutation, so a host that
//! simulates several page loads in separate processes sees the same cookies.
//!
//! ### I/O characteristics & caveats
//! - Every mutation rewrites the entire file. The jar only ever holds a handful
//!   of cookies, so this stays cheap.
//! - File writes are not atomic.
//! - A file that cannot be parsed is treated as an empty jar and overwritten on
//!   the next mutation.
use crate::cookies::{Cookie, CookieJar, DefaultCookieJar};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A `CookieJar` decorator that persists changes after each mutation.
///
/// This type is *transparent* for reads but *eagerly* persists after writes.
pub struct PersistentCookieJar {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,
    /// Inner cookie jar that holds the actual cookie state.
    inner: DefaultCookieJar,
}

impl PersistentCookieJar {
    /// Opens the jar stored at `path`, creating an empty one if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let inner = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading cookie file {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Cookie file {} is unreadable ({}), starting empty", path.display(), e);
                DefaultCookieJar::new()
            })
        } else {
            DefaultCookieJar::new()
        };

        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current state of the jar to disk (pretty-printed).
    fn persist(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.inner).context("serializing cookies")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("writing cookie file {}", self.path.display()))
    }
}

impl CookieJar for PersistentCookieJar {
    fn get(&self, name: &str) -> Option<Cookie> {
        self.inner.get(name)
    }

    fn set(&mut self, cookie: Cookie) -> Result<()> {
        self.inner.set(cookie)?;
        self.persist()
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.inner.remove(name)?;
        self.persist()
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.clear()?;
        self.persist()
    }

    fn get_all_cookies(&self) -> Vec<Cookie> {
        self.inner.get_all_cookies()
    }
}
