//! Read flow: resolving identifiers and preferences on page load.
//!
//! The page is first reduced to a [`Snapshot`] (payload in the URL, content of
//! the cache). [`READ_GUARDS`] are then evaluated top-down and the first one
//! that matches picks the [`ReadState`]:
//!
//! 1. a redirect payload is present: verify it and cache it
//! 2. both slots say `REDIRECT_NEEDED`: redirect now or keep deferring
//! 3. both slots hold values: answer from the cache
//! 4. otherwise: cold start, probe third-party cookies and call the operator
//!
//! The payload is stripped from the URL while taking the snapshot, before any
//! redirect decision.

use super::{PafClient, Resolution};
use crate::cache::CachedValues;
use crate::endpoints::ProxyEndpoints;
use crate::errors::ClientError;
use crate::model::{IdsAndOptionalPreferences, OperatorResponse, Verify3pcResponse};
use crate::net::get_json;
use crate::query::RedirectPayload;
use crate::session::ThirdPartyCookies;
use crate::user_agent::is_browser_known_to_support_3pc;
use serde_json::Value;

/// What the read flow sees when it starts.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub payload: Option<RedirectPayload>,
    pub cached: CachedValues,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReadState {
    RedirectArrival(RedirectPayload),
    DeferredRedirect,
    WarmCache(IdsAndOptionalPreferences),
    ColdStart,
}

type Guard = fn(&Snapshot) -> Option<ReadState>;

pub(crate) const READ_GUARDS: [Guard; 4] = [redirect_arrival, deferred_redirect, warm_cache, cold_start];

fn redirect_arrival(s: &Snapshot) -> Option<ReadState> {
    s.payload.clone().map(ReadState::RedirectArrival)
}

fn deferred_redirect(s: &Snapshot) -> Option<ReadState> {
    matches!(s.cached, CachedValues::RedirectNeeded).then_some(ReadState::DeferredRedirect)
}

fn warm_cache(s: &Snapshot) -> Option<ReadState> {
    match &s.cached {
        CachedValues::Known(values) => Some(ReadState::WarmCache(values.clone())),
        _ => None,
    }
}

fn cold_start(_: &Snapshot) -> Option<ReadState> {
    Some(ReadState::ColdStart)
}

pub(crate) fn classify(snapshot: &Snapshot) -> ReadState {
    READ_GUARDS
        .iter()
        .find_map(|guard| guard(snapshot))
        .unwrap_or(ReadState::ColdStart)
}

impl PafClient {
    /// Reads the URL and the cache. The payload parameter is removed from the
    /// URL even when it cannot be decoded.
    pub(crate) fn snapshot(&self) -> Result<Snapshot, ClientError> {
        let payload = self.query.extract();
        self.query.strip();

        Ok(Snapshot {
            payload: payload?,
            cached: self.cache.load(),
        })
    }

    pub(crate) async fn read_flow(&self, endpoints: &ProxyEndpoints, trigger_redirect: bool) -> Result<Resolution, ClientError> {
        let id = self.session.id();
        let state = classify(&self.snapshot()?);

        match state {
            ReadState::RedirectArrival(payload) => {
                log::info!("[{}] Redirected from operator: YES", id);
                self.on_redirect_arrival(endpoints, payload).await
            }
            ReadState::DeferredRedirect => {
                log::info!("[{}] Redirect previously deferred", id);
                if trigger_redirect {
                    self.redirect_to_read(endpoints)
                } else {
                    Ok(Resolution::Deferred)
                }
            }
            ReadState::WarmCache(values) => {
                log::info!("[{}] Cookie found: YES", id);
                Ok(Resolution::Resolved(values))
            }
            ReadState::ColdStart => {
                log::info!("[{}] Cookie found: NO, redirected from operator: NO", id);
                self.on_cold_start(endpoints, trigger_redirect).await
            }
        }
    }

    async fn on_redirect_arrival(&self, endpoints: &ProxyEndpoints, payload: RedirectPayload) -> Result<Resolution, ClientError> {
        let id = self.session.id();

        if let Some(error) = payload.envelope.error {
            log::warn!("[{}] Operator returned an error: {}", id, error);
            return Err(ClientError::Operator(error));
        }
        let Some(response) = payload.envelope.response else {
            return Err(ClientError::VerificationFailed(
                "redirect payload carries neither a response nor an error".to_string(),
            ));
        };

        // Being redirected at all means cookies could not flow to the operator
        self.session.record_third_party_cookies(ThirdPartyCookies::Unsupported);

        let verdict = self
            .transport
            .post(&endpoints.verify_read()?, payload.raw)
            .await?;
        if !verification_passed(&verdict)? {
            log::warn!("[{}] Verification of redirect payload failed", id);
            return Err(ClientError::VerificationFailed(
                "operator response was rejected by the proxy".to_string(),
            ));
        }

        self.cache.store(&response.body)?;
        Ok(Resolution::Resolved(response.body))
    }

    async fn on_cold_start(&self, endpoints: &ProxyEndpoints, trigger_redirect: bool) -> Result<Resolution, ClientError> {
        let id = self.session.id();

        if !is_browser_known_to_support_3pc(&self.config.user_agent) {
            log::info!("[{}] Browser known to support 3PC: NO", id);
            self.session.record_third_party_cookies(ThirdPartyCookies::Unsupported);
            return self.redirect_decision(endpoints, trigger_redirect);
        }

        log::info!("[{}] Browser known to support 3PC: YES, attempt to read from JSON", id);
        let response: OperatorResponse = get_json(self.transport.as_ref(), &endpoints.read()?).await?;

        if response.body.has_persisted_identifier() {
            log::info!("[{}] Operator returned id & prefs: YES", id);
            self.session.record_third_party_cookies(ThirdPartyCookies::Supported);
            self.cache.store(&response.body)?;
            return Ok(Resolution::Resolved(response.body));
        }

        log::info!("[{}] Operator returned id & prefs: NO, verify 3PC on operator", id);
        let probe: Verify3pcResponse = get_json(self.transport.as_ref(), &endpoints.verify_3pc()?).await?;

        let supported = probe.is_supported();
        log::info!("[{}] 3PC verification OK: {}", id, if supported { "YES" } else { "NO" });
        self.session
            .record_third_party_cookies(ThirdPartyCookies::from_supported(supported));

        if supported {
            self.cache.store_not_participating()?;
            return Ok(Resolution::Resolved(IdsAndOptionalPreferences {
                identifiers: response.body.identifiers,
                preferences: None,
            }));
        }

        self.redirect_decision(endpoints, trigger_redirect)
    }

    /// Leaves for the operator now, or remembers to do it on a later page load.
    fn redirect_decision(&self, endpoints: &ProxyEndpoints, trigger_redirect: bool) -> Result<Resolution, ClientError> {
        if trigger_redirect {
            return self.redirect_to_read(endpoints);
        }

        log::info!("[{}] Redirect needed, deferring", self.session.id());
        self.cache.store_redirect_needed()?;
        Ok(Resolution::Deferred)
    }

    fn redirect_to_read(&self, endpoints: &ProxyEndpoints) -> Result<Resolution, ClientError> {
        let target = self.query.build(endpoints.redirect_read()?, &[]);
        Ok(self.navigate(target))
    }
}

/// The verification endpoint answers with the verified body, or with a falsy
/// value (`null`, `false`, `0`, `""`, an empty body) on failure.
fn verification_passed(response: &crate::net::Response) -> Result<bool, ClientError> {
    if !response.is_success() {
        return Err(ClientError::HttpStatus {
            url: response.url.clone(),
            status: response.status,
        });
    }
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(false);
    }

    let value: Value = serde_json::from_slice(&response.body)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}
