//! Addresses of the operator endpoints behind a proxy.
//!
//! All operator traffic goes through `{proxy_base}{proxy_prefix}{path}`. REST
//! endpoints are fetched with credentials; redirect endpoints are navigation
//! targets only.

use crate::errors::ClientError;
use url::Url;

pub const READ: &str = "/v1/json/read";
pub const WRITE: &str = "/v1/json/write";
pub const VERIFY_3PC: &str = "/v1/json/verify3PC";
pub const SIGN_PREFS: &str = "/v1/sign/prefs";
pub const SIGN_WRITE: &str = "/v1/sign/write";
pub const VERIFY_READ: &str = "/v1/verify/read";
pub const REDIRECT_READ: &str = "/v1/redirect/get";
pub const REDIRECT_WRITE: &str = "/v1/redirect/post";

#[derive(Debug, Clone)]
pub struct ProxyEndpoints {
    base: Url,
    prefix: String,
}

impl ProxyEndpoints {
    pub fn new(base: Url, prefix: &str) -> Self {
        Self {
            base,
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, endpoint: &str) -> Result<Url, ClientError> {
        let base = self.base.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}{}", base, self.prefix, endpoint))?)
    }

    pub fn read(&self) -> Result<Url, ClientError> { self.url(READ) }
    pub fn write(&self) -> Result<Url, ClientError> { self.url(WRITE) }
    pub fn verify_3pc(&self) -> Result<Url, ClientError> { self.url(VERIFY_3PC) }
    pub fn sign_prefs(&self) -> Result<Url, ClientError> { self.url(SIGN_PREFS) }
    pub fn sign_write(&self) -> Result<Url, ClientError> { self.url(SIGN_WRITE) }
    pub fn verify_read(&self) -> Result<Url, ClientError> { self.url(VERIFY_READ) }
    pub fn redirect_read(&self) -> Result<Url, ClientError> { self.url(REDIRECT_READ) }
    pub fn redirect_write(&self) -> Result<Url, ClientError> { self.url(REDIRECT_WRITE) }
}
