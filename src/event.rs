use std::collections::BTreeMap;

/// A tracked action: a name plus string properties, or a plain page view
/// when no name is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: Option<String>,
    properties: BTreeMap<String, String>,
    /// Page url for back-end page-view beacons. Front-end page views are
    /// emitted as a bare `woopra.track()` and never carry one.
    url: Option<String>,
}

impl Event {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            properties: BTreeMap::new(),
            url: None,
        }
    }

    pub fn page_view() -> Self {
        Self {
            name: None,
            properties: BTreeMap::new(),
            url: None,
        }
    }

    pub fn page_view_at(url: impl Into<String>) -> Self {
        Self {
            name: None,
            properties: BTreeMap::new(),
            url: Some(url.into()),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn page_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_page_view(&self) -> bool {
        self.name.is_none()
    }
}

/// Optional delivery metadata for back-end beacons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMeta {
    /// Event time as unix milliseconds, when the event did not happen now.
    pub timestamp: Option<i64>,
    /// Referring page, sent as the `referer` beacon parameter.
    pub referrer: Option<String>,
}
