//! Query-string channel.
//!
//! When third-party cookies are unavailable the operator talks to the page
//! through its URL. On the way back, the `paf` parameter carries a base64
//! encoded JSON [`RedirectEnvelope`]. On the way out, redirect URLs carry a
//! `returnUrl` parameter and, for writes, the JSON request in `paf`.
//!
//! A payload is single-use: once read, [`QueryChannel::strip`] removes it from
//! the visible URL so a later resolution on the same page never sees it again.

use crate::errors::ClientError;
use crate::model::RedirectEnvelope;
use crate::page::Location;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use std::sync::Arc;
use url::Url;

/// Query parameter carrying protocol payloads.
pub const DATA_PARAM: &str = "paf";
/// Query parameter carrying the URL to come back to after a redirect.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// A payload found in the page URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectPayload {
    /// Decoded JSON text, forwarded as-is to the verification endpoint.
    pub raw: String,
    pub envelope: RedirectEnvelope,
}

pub struct QueryChannel {
    location: Arc<dyn Location>,
}

impl QueryChannel {
    pub fn new(location: Arc<dyn Location>) -> Self {
        Self { location }
    }

    /// Reads and decodes the payload parameter, if present. An empty value
    /// counts as absent.
    pub fn extract(&self) -> Result<Option<RedirectPayload>, ClientError> {
        let url = self.location.href();
        let Some(encoded) = url
            .query_pairs()
            .find(|(k, _)| k == DATA_PARAM)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.trim().is_empty())
        else {
            return Ok(None);
        };

        let raw = decode_payload(&encoded)?;
        let envelope = serde_json::from_str::<RedirectEnvelope>(&raw)
            .map_err(|e| ClientError::MalformedPayload(format!("invalid JSON envelope: {e}")))?;

        Ok(Some(RedirectPayload { raw, envelope }))
    }

    /// Removes the payload parameter from the visible URL. Every other
    /// parameter is kept exactly as written, and so is the fragment. Does
    /// nothing when the parameter is absent.
    pub fn strip(&self) {
        let mut url = self.location.href();
        let Some(query) = url.query() else {
            return;
        };

        let segments: Vec<&str> = query.split('&').collect();
        let kept: Vec<&str> = segments.iter().copied().filter(|s| !is_data_param(s)).collect();
        if kept.len() == segments.len() {
            return;
        }

        let kept = kept.join("&");
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(kept.as_str()));
        }

        log::debug!("Removed {} parameter from page URL", DATA_PARAM);
        self.location.replace_state(url);
    }

    /// Builds a redirect target: `endpoint` plus the current page as return URL,
    /// followed by `extra` parameters.
    pub fn build(&self, endpoint: Url, extra: &[(&str, &str)]) -> Url {
        let mut target = endpoint;
        let return_url = self.location.href();
        {
            let mut pairs = target.query_pairs_mut();
            pairs.append_pair(RETURN_URL_PARAM, return_url.as_str());
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        target
    }
}

fn is_data_param(segment: &str) -> bool {
    url::form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(k, _)| k == DATA_PARAM)
}

/// Encodes an envelope the way the operator puts it in the query string.
pub fn encode_payload(envelope: &RedirectEnvelope) -> Result<String, ClientError> {
    let json = serde_json::to_string(envelope)?;
    Ok(STANDARD.encode(json))
}

/// Accepts both the standard and the URL-safe alphabets, with or without padding.
fn decode_payload(encoded: &str) -> Result<String, ClientError> {
    let normalized: String = encoded
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            // A '+' sent unescaped shows up as a space once the query is decoded
            ' ' => '+',
            c => c,
        })
        .collect();

    let bytes = STANDARD_NO_PAD
        .decode(normalized)
        .map_err(|e| ClientError::MalformedPayload(format!("invalid base64: {e}")))?;

    String::from_utf8(bytes).map_err(|e| ClientError::MalformedPayload(format!("invalid UTF-8: {e}")))
}
