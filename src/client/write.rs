//! Write and signing flows.
//!
//! A write always starts by clearing both cache slots, then branches on the
//! page's third-party cookie verdict. It never probes: with an unknown verdict
//! the write goes through a redirect and the proxy signs server-side.

use super::{PafClient, Resolution};
use crate::endpoints::ProxyEndpoints;
use crate::errors::ClientError;
use crate::model::{IdsAndPreferences, NewPreferences, OperatorResponse, Preferences};
use crate::net::post_json;
use crate::query::DATA_PARAM;
use crate::session::ThirdPartyCookies;
use serde_json::Value;

impl PafClient {
    pub(crate) async fn write_flow(&self, endpoints: &ProxyEndpoints, request: &IdsAndPreferences) -> Result<Resolution, ClientError> {
        let id = self.session.id();

        self.cache.clear_all()?;

        match self.session.third_party_cookies() {
            ThirdPartyCookies::Supported => {
                log::info!("[{}] 3PC supported, sign and write through REST", id);
                let signed: Value = post_json(self.transport.as_ref(), &endpoints.sign_write()?, request).await?;
                let response: OperatorResponse = post_json(self.transport.as_ref(), &endpoints.write()?, &signed).await?;

                self.cache.store(&response.body)?;
                Ok(Resolution::Resolved(response.body))
            }
            ThirdPartyCookies::Unsupported | ThirdPartyCookies::Unknown => {
                log::info!("[{}] 3PC not known to work, write through redirect", id);
                let payload = serde_json::to_string(request)?;
                let target = self.query.build(endpoints.redirect_write()?, &[(DATA_PARAM, &payload)]);
                Ok(self.navigate(target))
            }
        }
    }

    pub(crate) async fn sign_flow(&self, endpoints: &ProxyEndpoints, input: &NewPreferences) -> Result<Preferences, ClientError> {
        log::debug!("[{}] Signing new preferences", self.session.id());
        post_json(self.transport.as_ref(), &endpoints.sign_prefs()?, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, Slot};
    use crate::client::fixtures::*;
    use crate::model::{Identifier, UnsignedPreferences};
    use crate::net::mock::MockTransport;
    use crate::query::RETURN_URL_PARAM;
    use serde_json::json;

    fn request() -> IdsAndPreferences {
        IdsAndPreferences {
            identifiers: vec![Identifier::new("abc")],
            preferences: Preferences(json!({"data": {"use_browsing_for_personalization": false}})),
        }
    }

    #[tokio::test]
    async fn supported_signs_then_writes_and_caches() {
        let transport = MockTransport::new()
            .reply(SIGN_WRITE_PATH, json!({"body": {"identifiers": [{"value": "abc"}]}, "signature": "s"}))
            .reply(
                WRITE_PATH,
                json!({"body": {
                    "identifiers": [{"value": "abc"}],
                    "preferences": {"data": {"use_browsing_for_personalization": false}}
                }}),
            );
        let h = harness(PAGE, CHROME_UA, transport);
        h.client.session().record_third_party_cookies(ThirdPartyCookies::Supported);

        let result = h.client.write_ids_and_preferences(&proxy(), &request()).await.unwrap().unwrap();

        assert_eq!(result.identifiers, vec![Identifier::new("abc")]);
        assert_eq!(result.preferences, Some(request().preferences));

        let calls = h.transport.calls();
        assert_eq!(h.transport.paths(), vec![SIGN_WRITE_PATH.to_string(), WRITE_PATH.to_string()]);
        assert_eq!(calls[0].body.as_deref(), Some(serde_json::to_string(&request()).unwrap().as_str()));
        let forwarded: Value = serde_json::from_str(calls[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(forwarded["signature"], "s");

        assert!(matches!(h.client.cache().read(Slot::Identifiers), Some(CacheEntry::Participating(_))));
        assert!(matches!(h.client.cache().read(Slot::Preferences), Some(CacheEntry::Participating(_))));
        assert!(h.page.navigations().is_empty());
    }

    #[tokio::test]
    async fn unknown_support_redirects_with_unsigned_request() {
        let h = harness(PAGE, CHROME_UA, MockTransport::new());

        let result = h.client.write_ids_and_preferences(&proxy(), &request()).await.unwrap();

        assert!(result.is_none());
        assert!(h.transport.calls().is_empty());

        let target = h.page.last_navigation().unwrap();
        assert_eq!(target.path(), REDIRECT_WRITE_PATH);
        let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], (RETURN_URL_PARAM.to_string(), PAGE.to_string()));
        assert_eq!(pairs[1].0, DATA_PARAM);
        let sent: IdsAndPreferences = serde_json::from_str(&pairs[1].1).unwrap();
        assert_eq!(sent, request());
    }

    #[tokio::test]
    async fn write_clears_cache_even_when_it_fails() {
        let transport = MockTransport::new().reply_status(SIGN_WRITE_PATH, 503);
        let h = harness(PAGE, CHROME_UA, transport);
        h.client.cache().store_not_participating().unwrap();
        h.client.session().record_third_party_cookies(ThirdPartyCookies::Supported);

        let err = h.client.write_ids_and_preferences(&proxy(), &request()).await.unwrap_err();

        assert!(matches!(err, ClientError::HttpStatus { status: 503, .. }));
        assert!(h.client.cache().read(Slot::Identifiers).is_none());
        assert!(h.client.cache().read(Slot::Preferences).is_none());
    }

    #[tokio::test]
    async fn write_after_unsupported_read_uses_redirect() {
        let h = harness(PAGE, SAFARI_UA, MockTransport::new());
        h.client.refresh_ids_and_preferences(&refresh(false)).await.unwrap();
        assert_eq!(h.client.cache().read(Slot::Identifiers), Some(CacheEntry::RedirectNeeded));

        h.client.write_ids_and_preferences(&proxy(), &request()).await.unwrap();

        assert_eq!(h.page.last_navigation().unwrap().path(), REDIRECT_WRITE_PATH);
        assert!(h.client.cache().read(Slot::Identifiers).is_none());
    }

    #[tokio::test]
    async fn sign_preferences_is_a_pass_through() {
        let signed = json!({"version": "0.1", "data": {"use_browsing_for_personalization": true}, "source": {"signature": "x"}});
        let h = harness(PAGE, CHROME_UA, MockTransport::new().reply(SIGN_PREFS_PATH, signed.clone()));
        let input = NewPreferences {
            identifiers: vec![Identifier::new("abc")],
            unsigned_preferences: UnsignedPreferences {
                version: "0.1".into(),
                data: json!({"use_browsing_for_personalization": true}),
            },
        };

        let prefs = h.client.sign_preferences(&proxy(), &input).await.unwrap();

        assert_eq!(prefs, Preferences(signed));
        let calls = h.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        let body: Value = serde_json::from_str(calls[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["unsignedPreferences"]["version"], "0.1");
        assert!(h.client.cache().jar().read().unwrap().get_all_cookies().is_empty());
    }
}
