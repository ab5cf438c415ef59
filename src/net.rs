//! Network layer: the [`Transport`] capability and its reqwest implementation.
//!
//! The resolution flows only ever issue two kinds of calls to the proxy: a GET
//! and a POST with a JSON text body, both with credentials (cookies) included.
//! Hosts plug a [`Transport`] in; [`ReqwestTransport`] is the default one.

mod fetch;
mod response;
#[cfg(test)]
pub(crate) mod mock;

pub use fetch::{fetch, ReqwestTransport};
pub use response::Response;

use crate::errors::ClientError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

pub type TransportHandle = Arc<dyn Transport>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a credentialed GET.
    async fn get(&self, url: &Url) -> Result<Response, ClientError>;

    /// Issues a credentialed POST carrying `body` verbatim.
    async fn post(&self, url: &Url, body: String) -> Result<Response, ClientError>;
}

pub async fn get_json<T: DeserializeOwned>(transport: &dyn Transport, url: &Url) -> Result<T, ClientError> {
    transport.get(url).await?.json()
}

pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    transport: &dyn Transport,
    url: &Url,
    body: &B,
) -> Result<T, ClientError> {
    let body = serde_json::to_string(body)?;
    transport.post(url, body).await?.json()
}
