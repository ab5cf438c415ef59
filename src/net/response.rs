//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response returned by a
//! [`Transport`](crate::net::Transport). It contains the final URL, status code
//! and reason, response headers, and the raw body bytes.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names.
//! - [`Response::json`] refuses non-2xx answers so callers never mistake an
//!   error page for operator data.
//!
use crate::errors::ClientError;
use http::HeaderMap;
use serde::de::DeserializeOwned;

/// Simple structure for HTTP responses.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// A 200 answer with a JSON body. Mostly useful for hosts and tests
    /// providing their own transport.
    pub fn ok_json(url: url::Url, body: &serde_json::Value) -> Self {
        Self {
            url,
            status: 200,
            status_text: "OK".to_string(),
            headers: HeaderMap::new(),
            body: body.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON after checking the status.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        if !self.is_success() {
            return Err(ClientError::HttpStatus {
                url: self.url.clone(),
                status: self.status,
            });
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}
