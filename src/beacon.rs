use std::collections::BTreeMap;
use url::Url;

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::event::{Event, EventMeta};

/// Woopra's tracking ingestion base. Identify and track endpoints hang
/// off this path.
pub const TRACK_BASE_URL: &str = "http://www.woopra.com/track/";

/// Builds beacon URLs and fires them as HTTP GETs.
///
/// Fire-and-forget: the response body is discarded and no retries are
/// attempted. [`BeaconClient::send`] reports transport failures so tests
/// can observe them; the tracker-level operations log and swallow them.
pub struct BeaconClient {
    http: reqwest::Client,
    base: Url,
    user_agent: Option<String>,
}

impl BeaconClient {
    pub fn new() -> Result<Self, TrackerError> {
        Self::with_base(TRACK_BASE_URL)
    }

    /// Point the client at a different ingestion base, e.g. a test server.
    pub fn with_base(base: &str) -> Result<Self, TrackerError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base: Url::parse(base)?,
            user_agent: None,
        })
    }

    /// Forward the visitor's browser User-Agent with every beacon.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// `track/identify/?host=..&cookie=..&ip=..&timeout=..&cv_<k>=<v>..`
    pub fn identify_url(
        &self,
        config: &TrackerConfig,
        visitor: &BTreeMap<String, String>,
    ) -> Result<Url, TrackerError> {
        let mut url = self.base.join("identify/")?;
        {
            let mut query = url.query_pairs_mut();
            append_common(&mut query, config);
            append_visitor(&mut query, visitor);
        }
        Ok(url)
    }

    /// `track/ce/?..` with the common and visitor parameters, then either
    /// `ce_name=<event>&ce_<k>=<v>..` or `ce_name=pv&ce_url=<page>`.
    pub fn track_url(
        &self,
        config: &TrackerConfig,
        visitor: &BTreeMap<String, String>,
        event: &Event,
        meta: Option<&EventMeta>,
    ) -> Result<Url, TrackerError> {
        let mut url = self.base.join("ce/")?;
        {
            let mut query = url.query_pairs_mut();
            append_common(&mut query, config);
            append_visitor(&mut query, visitor);

            match event.name() {
                Some(name) => {
                    query.append_pair("ce_name", name);
                    for (key, value) in event.properties() {
                        query.append_pair(&format!("ce_{key}"), value);
                    }
                }
                None => {
                    query.append_pair("ce_name", "pv");
                    query.append_pair("ce_url", event.page_url().unwrap_or(&config.domain));
                }
            }

            if let Some(meta) = meta {
                if let Some(ts) = meta.timestamp {
                    query.append_pair("timestamp", &ts.to_string());
                }
                if let Some(referrer) = &meta.referrer {
                    query.append_pair("referer", referrer);
                }
            }
        }
        Ok(url)
    }

    /// Fire one beacon and discard the response body.
    pub async fn send(&self, url: Url) -> Result<(), TrackerError> {
        let mut request = self.http.get(url);
        if let Some(ua) = &self.user_agent {
            request = request.header(reqwest::header::USER_AGENT, ua);
        }
        let response = request.send().await?;
        tracing::debug!(status = %response.status(), "beacon delivered");
        Ok(())
    }
}

type QueryPairs<'a> = url::form_urlencoded::Serializer<'a, url::UrlQuery<'a>>;

fn append_common(query: &mut QueryPairs<'_>, config: &TrackerConfig) {
    query.append_pair("host", &config.domain);
    query.append_pair("cookie", &config.cookie_value);
    query.append_pair("ip", &config.ip_address);
    query.append_pair("timeout", &config.idle_timeout.to_string());
}

fn append_visitor(query: &mut QueryPairs<'_>, visitor: &BTreeMap<String, String>) {
    for (key, value) in visitor {
        query.append_pair(&format!("cv_{key}"), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> TrackerConfig {
        let mut cfg = TrackerConfig::default();
        cfg.update(
            json!({
                "domain": "ralphsamuel.io",
                "cookie_value": "AAAABBBBCCCC",
                "ip_address": "10.0.0.7",
            })
            .as_object()
            .unwrap(),
        );
        cfg
    }

    fn visitor() -> BTreeMap<String, String> {
        BTreeMap::from([("name".to_string(), "tigi".to_string())])
    }

    #[test]
    fn identify_url_carries_host_and_visitor_properties() {
        let client = BeaconClient::new().unwrap();
        let url = client.identify_url(&config(), &visitor()).unwrap();

        assert!(url.as_str().starts_with("http://www.woopra.com/track/identify/?"));
        let query = url.query().unwrap();
        assert!(query.contains("host=ralphsamuel.io"));
        assert!(query.contains("cookie=AAAABBBBCCCC"));
        assert!(query.contains("ip=10.0.0.7"));
        assert!(query.contains("timeout=300000"));
        assert!(query.contains("cv_name=tigi"));
    }

    #[test]
    fn track_url_carries_event_name_and_properties() {
        let client = BeaconClient::new().unwrap();
        let event = Event::named("play").with("title", "TITLE");
        let url = client.track_url(&config(), &visitor(), &event, None).unwrap();

        assert!(url.as_str().starts_with("http://www.woopra.com/track/ce/?"));
        let query = url.query().unwrap();
        assert!(query.contains("ce_name=play"));
        assert!(query.contains("ce_title=TITLE"));
        assert!(query.contains("cv_name=tigi"));
    }

    #[test]
    fn page_view_track_url_uses_pv_and_page_url() {
        let client = BeaconClient::new().unwrap();
        let event = Event::page_view_at("ralphsamuel.io/docs/intro");
        let url = client.track_url(&config(), &visitor(), &event, None).unwrap();

        let query = url.query().unwrap();
        assert!(query.contains("ce_name=pv"));
        assert!(query.contains("ce_url=ralphsamuel.io%2Fdocs%2Fintro"));
    }

    #[test]
    fn page_view_without_url_falls_back_to_domain() {
        let client = BeaconClient::new().unwrap();
        let url = client
            .track_url(&config(), &BTreeMap::new(), &Event::page_view(), None)
            .unwrap();

        assert!(url.query().unwrap().contains("ce_url=ralphsamuel.io"));
    }

    #[test]
    fn meta_adds_timestamp_and_referer() {
        let client = BeaconClient::new().unwrap();
        let meta = EventMeta {
            timestamp: Some(123),
            referrer: Some("docs.woopra.com".into()),
        };
        let url = client
            .track_url(&config(), &visitor(), &Event::named("play"), Some(&meta))
            .unwrap();

        let query = url.query().unwrap();
        assert!(query.contains("timestamp=123"));
        assert!(query.contains("referer=docs.woopra.com"));
    }

    #[test]
    fn values_are_percent_encoded() {
        let client = BeaconClient::new().unwrap();
        let mut visitor = BTreeMap::new();
        visitor.insert("email".to_string(), "a b@example.com".to_string());
        let url = client.identify_url(&config(), &visitor).unwrap();

        assert!(url.query().unwrap().contains("cv_email=a+b%40example.com"));
    }
}
