use crate::errors::ClientError;
use crate::net::{Response, Transport};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use url::Url;

// Sends a request and buffers the response. We don't do streaming
pub async fn fetch(request: reqwest::RequestBuilder) -> Result<Response, reqwest::Error> {
    let res = request.send().await?;

    // Fetch results
    let final_url = res.url().clone();
    let status = res.status().as_u16();
    let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
    let headers = res.headers().clone();

    let body = res.bytes().await?.to_vec();

    Ok(Response {
        url: final_url,
        status,
        status_text,
        headers,
        body,
    })
}

/// Transport backed by a reqwest client with its own cookie store, so cookies
/// set by the proxy flow back on later calls (`credentials: include`).
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<Response, ClientError> {
        log::debug!("GET {}", url);
        Ok(fetch(self.client.get(url.clone())).await?)
    }

    async fn post(&self, url: &Url, body: String) -> Result<Response, ClientError> {
        log::debug!("POST {}", url);
        // text/plain keeps the cross-origin call a simple request (no preflight)
        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(body);
        Ok(fetch(request).await?)
    }
}
