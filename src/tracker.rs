use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::beacon::BeaconClient;
use crate::config::TrackerConfig;
use crate::cookie;
use crate::error::TrackerError;
use crate::event::{Event, EventMeta};
use crate::snippet;

/// The Woopra tracker object, one per request in a server context.
///
/// Front-end flow: buffer `config`/`identify`/`track` calls, then render
/// them into the page with [`WoopraTracker::woopra_code`]. Once the
/// snippet is on the page the buffering stops and `track`/`push` return
/// standalone `<script>` blocks instead.
///
/// Back-end flow: [`WoopraTracker::track_backend`] and
/// [`WoopraTracker::push_backend`] fire beacons directly, no browser
/// involved.
pub struct WoopraTracker {
    config: TrackerConfig,
    pending_config: Map<String, Value>,
    visitor: BTreeMap<String, String>,
    visitor_up_to_date: bool,
    events: Vec<Event>,
    ready: bool,
    beacon: BeaconClient,
}

impl WoopraTracker {
    pub fn new() -> Result<Self, TrackerError> {
        Self::with_config(TrackerConfig::default())
    }

    /// A fresh visitor cookie value is generated unless the configuration
    /// carries one from the incoming request.
    pub fn with_config(mut config: TrackerConfig) -> Result<Self, TrackerError> {
        if config.cookie_value.is_empty() {
            config.cookie_value = cookie::random_cookie_value();
        }
        Ok(Self {
            config,
            pending_config: Map::new(),
            visitor: BTreeMap::new(),
            visitor_up_to_date: true,
            events: Vec::new(),
            ready: false,
            beacon: BeaconClient::new()?,
        })
    }

    /// Replace the beacon client, e.g. to forward a User-Agent or to aim
    /// at a different endpoint.
    pub fn with_beacon(mut self, beacon: BeaconClient) -> Self {
        self.beacon = beacon;
        self
    }

    /// Merge configuration overrides; invalid entries are logged and
    /// skipped, accepted ones are staged for the next snippet. Each call
    /// restarts the staged set, so only the latest call's entries are
    /// emitted; the effective configuration keeps everything applied.
    pub fn config(&mut self, overrides: &Map<String, Value>) -> &mut Self {
        self.pending_config = self.config.update(overrides);
        self
    }

    /// Replace the visitor's identity; it is re-sent on the next
    /// emission or `push_backend`.
    pub fn identify(&mut self, visitor: BTreeMap<String, String>) -> &mut Self {
        self.visitor = visitor;
        self.visitor_up_to_date = false;
        self
    }

    /// Queue an event for the next snippet, or render it immediately once
    /// the tracker is on the page.
    ///
    /// Returns the `<script>` block to embed when the snippet has already
    /// been emitted, `None` while calls are still being buffered.
    pub fn track(&mut self, event: Event) -> Option<String> {
        if self.ready && event.is_page_view() {
            let mut calls = self.pending_calls();
            calls.push(snippet::render_track(&event));
            return Some(snippet::script_block(&calls));
        }
        self.events.push(event);
        if self.ready {
            let mut calls = self.pending_calls();
            calls.extend(self.events.drain(..).map(|ev| snippet::render_track(&ev)));
            Some(snippet::script_block(&calls))
        } else {
            None
        }
    }

    pub fn track_page_view(&mut self) -> Option<String> {
        self.track(Event::page_view())
    }

    /// Render a front-end flush: pending configuration and identity
    /// followed by `woopra.push()`.
    pub fn push(&mut self) -> String {
        let mut calls = self.pending_calls();
        calls.push(snippet::render_push());
        snippet::script_block(&calls)
    }

    /// The full Woopra snippet: the script loader plus every buffered
    /// call, in order. Marks the tracker ready and clears the buffers.
    pub fn woopra_code(&mut self) -> String {
        self.ready = true;
        let mut calls = self.pending_calls();
        calls.extend(self.events.drain(..).map(|ev| snippet::render_track(&ev)));
        snippet::widget_block(&calls)
    }

    /// Fire a `ce` beacon for an event right now. Transport failures are
    /// logged and never surface.
    pub async fn track_backend(&mut self, event: &Event, meta: Option<&EventMeta>) {
        match self.beacon.track_url(&self.config, &self.visitor, event, meta) {
            Ok(url) => {
                if let Err(err) = self.beacon.send(url).await {
                    tracing::warn!(error = %err, "track beacon failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "track beacon url could not be built"),
        }
    }

    /// Fire an `identify` beacon with the visitor's properties right now.
    pub async fn push_backend(&mut self) {
        match self.beacon.identify_url(&self.config, &self.visitor) {
            Ok(url) => {
                if let Err(err) = self.beacon.send(url).await {
                    tracing::warn!(error = %err, "identify beacon failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "identify beacon url could not be built"),
        }
        self.visitor_up_to_date = true;
    }

    /// `Set-Cookie` header value for the visitor cookie. Attach it before
    /// response headers are flushed.
    pub fn set_cookie_header(&self) -> Result<String, TrackerError> {
        cookie::set_cookie_header(&self.config)
    }

    pub fn effective_config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn queued_events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn pending_calls(&mut self) -> Vec<String> {
        let mut calls = Vec::new();
        if !self.pending_config.is_empty() {
            calls.push(snippet::render_config(&self.pending_config));
            self.pending_config = Map::new();
        }
        if !self.visitor_up_to_date {
            calls.push(snippet::render_identify(&self.visitor));
            self.visitor_up_to_date = true;
        }
        calls
    }
}
