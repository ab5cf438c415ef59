//! Client configuration.
//!
//! `ClientConfig` controls the properties of a [`PafClient`](crate::client::PafClient):
//! the user agent fed to the third-party cookie heuristic, the lifetime of the
//! cached cookies, their names and the path prefix under which the proxy exposes
//! the operator endpoints.
//!
//! # Examples
//!
//! ```rust
//! use paf_client::config::ClientConfig;
//! use std::time::Duration;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ClientConfig::builder()
//!     .user_agent("Mozilla/5.0 (X11; Linux x86_64) Chrome/120.0.0.0 Safari/537.36")
//!     .cookie_ttl(Duration::from_secs(30 * 24 * 3600))
//!     .build()?;
//! assert_eq!(cfg.proxy_prefix, "/prebid");
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Builder validation returns [`ConfigError`] for a zero TTL, empty or identical
//! cookie names, or a prefix that does not start with `/`.

use std::fmt;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Three months, the lifetime of the cached identifiers and preferences.
pub const DEFAULT_COOKIE_TTL: Duration = Duration::from_secs(90 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent of the browser the client runs in
    pub user_agent: String,
    /// How long cached values stay valid
    pub cookie_ttl: Duration,
    /// Path under the proxy base where the operator endpoints live
    pub proxy_prefix: String,
    /// Name of the cookie holding the identifiers
    pub identifiers_cookie: String,
    /// Name of the cookie holding the preferences
    pub preferences_cookie: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie_ttl: DEFAULT_COOKIE_TTL,
            proxy_prefix: "/prebid".to_string(),
            identifiers_cookie: "paf_identifiers".to_string(),
            preferences_cookie: "paf_preferences".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    inner: ClientConfig,
}

impl ClientConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ClientConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn cookie_ttl(self, ttl: Duration) -> Self { self.map(|c| c.cookie_ttl = ttl) }
    pub fn proxy_prefix<S: Into<String>>(self, prefix: S) -> Self { self.map(|c| c.proxy_prefix = prefix.into()) }
    pub fn identifiers_cookie<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.identifiers_cookie = name.into()) }
    pub fn preferences_cookie<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.preferences_cookie = name.into()) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ClientConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroTtl,
    EmptyCookieName,
    SameCookieName(String),
    InvalidProxyPrefix(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTtl =>
                write!(f, "cookie_ttl must be greater than zero"),
            ConfigError::EmptyCookieName =>
                write!(f, "cookie names must not be empty"),
            ConfigError::SameCookieName(name) =>
                write!(f, "identifiers and preferences cookies share the name {name:?}"),
            ConfigError::InvalidProxyPrefix(prefix) =>
                write!(f, "proxy_prefix {prefix:?} must be empty or start with '/'"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &ClientConfig) -> Result<(), ConfigError> {
    if c.cookie_ttl.is_zero() {
        return Err(ConfigError::ZeroTtl);
    }
    if c.identifiers_cookie.is_empty() || c.preferences_cookie.is_empty() {
        return Err(ConfigError::EmptyCookieName);
    }
    if c.identifiers_cookie == c.preferences_cookie {
        return Err(ConfigError::SameCookieName(c.identifiers_cookie.clone()));
    }
    if !c.proxy_prefix.is_empty() && !c.proxy_prefix.starts_with('/') {
        return Err(ConfigError::InvalidProxyPrefix(c.proxy_prefix.clone()));
    }
    Ok(())
}
