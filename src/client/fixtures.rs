use super::{PafClient, ProxyOptions, RefreshOptions};
use crate::config::ClientConfig;
use crate::model::RedirectEnvelope;
use crate::net::mock::MockTransport;
use crate::page::SimulatedPage;
use crate::query::{encode_payload, DATA_PARAM};
use std::sync::Arc;
use url::Url;

pub(crate) const PAGE: &str = "https://publisher.example/article?id=7#comments";
pub(crate) const PROXY: &str = "https://proxy.publisher.example";

pub(crate) const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub(crate) const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15";

pub(crate) const READ_PATH: &str = "/prebid/v1/json/read";
pub(crate) const WRITE_PATH: &str = "/prebid/v1/json/write";
pub(crate) const VERIFY_3PC_PATH: &str = "/prebid/v1/json/verify3PC";
pub(crate) const VERIFY_READ_PATH: &str = "/prebid/v1/verify/read";
pub(crate) const SIGN_WRITE_PATH: &str = "/prebid/v1/sign/write";
pub(crate) const SIGN_PREFS_PATH: &str = "/prebid/v1/sign/prefs";
pub(crate) const REDIRECT_READ_PATH: &str = "/prebid/v1/redirect/get";
pub(crate) const REDIRECT_WRITE_PATH: &str = "/prebid/v1/redirect/post";

pub(crate) struct Harness {
    pub page: Arc<SimulatedPage>,
    pub transport: Arc<MockTransport>,
    pub client: PafClient,
}

pub(crate) fn harness(page_url: &str, user_agent: &str, transport: MockTransport) -> Harness {
    let page = Arc::new(SimulatedPage::new(Url::parse(page_url).unwrap()));
    let transport = Arc::new(transport);
    let config = ClientConfig::builder().user_agent(user_agent).build().unwrap();

    let client = PafClient::builder(page.clone(), page.clone())
        .config(config)
        .transport(transport.clone())
        .build()
        .unwrap();

    Harness { page, transport, client }
}

pub(crate) fn refresh(trigger_redirect_if_needed: bool) -> RefreshOptions {
    RefreshOptions {
        proxy_base: Url::parse(PROXY).unwrap(),
        trigger_redirect_if_needed,
    }
}

pub(crate) fn proxy() -> ProxyOptions {
    ProxyOptions { proxy_base: Url::parse(PROXY).unwrap() }
}

/// The test page as the operator sends the browser back to it.
pub(crate) fn page_with_payload(envelope: &RedirectEnvelope) -> String {
    let mut url = Url::parse("https://publisher.example/article?id=7#comments").unwrap();
    url.query_pairs_mut().append_pair(DATA_PARAM, &encode_payload(envelope).unwrap());
    url.to_string()
}
