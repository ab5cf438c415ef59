// src/client.rs
//! The client: [`PafClient`] and its entry points.
//!
//! A `PafClient` is built once per page load from the capabilities of its host
//! (cookie jar, location, navigator, transport) and a [`PageSession`]. It
//! answers three questions:
//!
//! - [`refresh_ids_and_preferences`](PafClient::refresh_ids_and_preferences):
//!   what are the identifiers and preferences of this user?
//! - [`write_ids_and_preferences`](PafClient::write_ids_and_preferences):
//!   store these identifiers and preferences at the operator.
//! - [`sign_preferences`](PafClient::sign_preferences): have new preferences signed.
//!
//! The read and write flows may end by leaving the page (see [`Resolution`]).
//! Calls are expected one at a time; overlapping calls on the same client race
//! on the cache and on the session's third-party cookie verdict. No timeout is
//! applied to network calls; wrap the futures if bounded latency matters.

mod read;
mod write;
#[cfg(test)]
mod fixtures;

use crate::cache::LocalCache;
use crate::config::ClientConfig;
use crate::cookies::{CookieJarHandle, DefaultCookieJar};
use crate::endpoints::ProxyEndpoints;
use crate::errors::ClientError;
use crate::model::{IdsAndOptionalPreferences, IdsAndPreferences, NewPreferences, Preferences};
use crate::net::{ReqwestTransport, TransportHandle};
use crate::page::{Location, Navigator};
use crate::query::QueryChannel;
use crate::session::{PageSession, ThirdPartyCookies};
use std::sync::Arc;
use url::Url;

/// Options of the operations that only need to reach the proxy.
#[derive(Debug, Clone)]
pub struct ProxyOptions {
    /// Origin of the proxy, e.g. `https://proxy.publisher.example`
    pub proxy_base: Url,
}

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub proxy_base: Url,
    /// Leave the page for the operator now if needed, instead of remembering
    /// to do it on a later call.
    pub trigger_redirect_if_needed: bool,
}

/// Terminal outcome of a read or write flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Values are known (possibly "not participating").
    Resolved(IdsAndOptionalPreferences),
    /// A redirect is needed but was postponed; call again with
    /// `trigger_redirect_if_needed` once the user interacted.
    Deferred,
    /// The page is being left for this URL.
    Redirecting(Url),
}

impl Resolution {
    pub fn into_values(self) -> Option<IdsAndOptionalPreferences> {
        match self {
            Resolution::Resolved(values) => Some(values),
            Resolution::Deferred | Resolution::Redirecting(_) => None,
        }
    }
}

pub struct PafClient {
    config: ClientConfig,
    cache: LocalCache,
    query: QueryChannel,
    navigator: Arc<dyn Navigator>,
    transport: TransportHandle,
    session: Arc<PageSession>,
}

impl PafClient {
    /// Starts building a client for the page exposed by `location` and `navigator`.
    pub fn builder(location: Arc<dyn Location>, navigator: Arc<dyn Navigator>) -> PafClientBuilder {
        PafClientBuilder {
            location,
            navigator,
            config: None,
            jar: None,
            transport: None,
            session: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn session(&self) -> &Arc<PageSession> {
        &self.session
    }

    /// Third-party cookie verdict for the current page.
    pub fn third_party_cookies(&self) -> ThirdPartyCookies {
        self.session.third_party_cookies()
    }

    fn endpoints(&self, proxy_base: &Url) -> ProxyEndpoints {
        ProxyEndpoints::new(proxy_base.clone(), &self.config.proxy_prefix)
    }

    /// Runs the read flow and reports how it ended.
    pub async fn resolve(&self, options: &RefreshOptions) -> Result<Resolution, ClientError> {
        let endpoints = self.endpoints(&options.proxy_base);
        let resolution = self.read_flow(&endpoints, options.trigger_redirect_if_needed).await?;
        log::info!("[{}] Finished: {:?}", self.session.id(), resolution);
        Ok(resolution)
    }

    /// Returns the current identifiers and preferences, or `None` when the flow
    /// was deferred or is leaving the page.
    pub async fn refresh_ids_and_preferences(
        &self,
        options: &RefreshOptions,
    ) -> Result<Option<IdsAndOptionalPreferences>, ClientError> {
        Ok(self.resolve(options).await?.into_values())
    }

    /// Runs the write flow and reports how it ended.
    pub async fn write(&self, options: &ProxyOptions, request: &IdsAndPreferences) -> Result<Resolution, ClientError> {
        let endpoints = self.endpoints(&options.proxy_base);
        let resolution = self.write_flow(&endpoints, request).await?;
        log::info!("[{}] Finished: {:?}", self.session.id(), resolution);
        Ok(resolution)
    }

    /// Stores identifiers and preferences at the operator. Returns `None` when
    /// the write goes through a redirect.
    pub async fn write_ids_and_preferences(
        &self,
        options: &ProxyOptions,
        request: &IdsAndPreferences,
    ) -> Result<Option<IdsAndOptionalPreferences>, ClientError> {
        Ok(self.write(options, request).await?.into_values())
    }

    /// Has the proxy sign new preferences. Nothing is cached.
    pub async fn sign_preferences(&self, options: &ProxyOptions, input: &NewPreferences) -> Result<Preferences, ClientError> {
        let endpoints = self.endpoints(&options.proxy_base);
        self.sign_flow(&endpoints, input).await
    }

    fn navigate(&self, url: Url) -> Resolution {
        log::info!("[{}] Redirecting to {}", self.session.id(), url);
        self.navigator.navigate(&url);
        Resolution::Redirecting(url)
    }
}

pub struct PafClientBuilder {
    location: Arc<dyn Location>,
    navigator: Arc<dyn Navigator>,
    config: Option<ClientConfig>,
    jar: Option<CookieJarHandle>,
    transport: Option<TransportHandle>,
    session: Option<Arc<PageSession>>,
}

impl PafClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Cookie jar backing the cache. Defaults to an in-memory jar.
    pub fn cookie_jar(mut self, jar: CookieJarHandle) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Defaults to a [`ReqwestTransport`] using the configured user agent.
    pub fn transport(mut self, transport: TransportHandle) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Shares a page session between clients. Defaults to a fresh session.
    pub fn session(mut self, session: Arc<PageSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> Result<PafClient, ClientError> {
        let config = self.config.unwrap_or_default();
        let jar = self.jar.unwrap_or_else(|| DefaultCookieJar::new().into_handle());
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(&config.user_agent)?),
        };

        Ok(PafClient {
            cache: LocalCache::new(jar, &config),
            query: QueryChannel::new(self.location),
            navigator: self.navigator,
            transport,
            session: self.session.unwrap_or_default(),
            config,
        })
    }
}
