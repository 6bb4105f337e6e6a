use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tracker configuration with the option set Woopra understands.
///
/// KEYS:
///
/// domain - Website hostname as added to Woopra
/// cookie_name - Name of the cookie used to identify the visitor
/// cookie_domain - Domain scope of the Woopra cookie
/// cookie_path - Directory scope of the Woopra cookie
/// ping - Ping woopra servers to ensure that the visitor is still on the webpage?
/// ping_interval - Time interval in milliseconds between each ping
/// idle_timeout - Idle time after which the visitor is considered offline
/// download_tracking - Track downloads on the web page
/// outgoing_tracking - Track external links clicks on the web page
/// download_pause - Milliseconds to pause the browser so a download click is tracked
/// outgoing_pause - Milliseconds to pause the browser so an outgoing click is tracked
/// ignore_query_url - Ignore the query part of the url on standard pageview tracking
/// hide_campaign - Remove captured campaign properties from the URL
/// ip_address - IP address of the visitor. For back-end processing, always set manually.
/// cookie_value - Value of the visitor cookie, if one came in with the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TrackerConfig {
    pub domain: String,
    pub cookie_name: String,
    pub cookie_domain: String,
    pub cookie_path: String,
    pub ping: bool,
    pub ping_interval: u64,
    pub idle_timeout: u64,
    pub download_tracking: bool,
    pub outgoing_tracking: bool,
    pub download_pause: u64,
    pub outgoing_pause: u64,
    pub ignore_query_url: bool,
    pub hide_campaign: bool,
    pub ip_address: String,
    pub cookie_value: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            cookie_name: "wooTracker".into(),
            cookie_domain: String::new(),
            cookie_path: "/".into(),
            ping: true,
            ping_interval: 12_000,
            idle_timeout: 300_000,
            download_tracking: true,
            outgoing_tracking: true,
            download_pause: 200,
            outgoing_pause: 400,
            ignore_query_url: true,
            hide_campaign: false,
            ip_address: String::new(),
            cookie_value: String::new(),
        }
    }
}

/// JSON view of the defaults, used to validate override keys and types.
static DEFAULTS: Lazy<Map<String, Value>> = Lazy::new(|| {
    match serde_json::to_value(TrackerConfig::default()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
});

/// Coarse JSON type used for override validation. Integer and float are
/// distinct: every numeric default is an integer, so a fractional
/// `ping_interval` must be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Array,
    Object,
}

impl Kind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(n) if n.is_f64() => Kind::Float,
            Value::Number(_) => Kind::Int,
            Value::String(_) => Kind::Str,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Int => "integer",
            Kind::Float => "float",
            Kind::Str => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl TrackerConfig {
    /// Load configuration from an optional `woopra.toml` in the working
    /// directory, `WOOPRA__`-prefixed environment variables, and an
    /// optional explicit file, later sources winning.
    pub fn load(path: Option<&str>) -> Result<Self, crate::TrackerError> {
        Self::from_builder(build_config(path)?)
    }

    fn from_builder(cfg: config::Config) -> Result<Self, crate::TrackerError> {
        Ok(cfg.try_deserialize()?)
    }

    /// Apply proposed overrides entry by entry.
    ///
    /// Entries with an unknown key or a value whose type differs from the
    /// default's type are logged and skipped; the rest overwrite the
    /// effective configuration. Returns the accepted entries, which the
    /// tracker stages for snippet emission. Accepting `domain` while
    /// `cookie_domain` is still empty also sets `cookie_domain`.
    pub fn update(&mut self, overrides: &Map<String, Value>) -> Map<String, Value> {
        let mut accepted = Map::new();
        for (key, value) in overrides {
            let Some(default) = DEFAULTS.get(key) else {
                tracing::warn!(key = %key, "unexpected parameter in configuration");
                continue;
            };
            let expected = Kind::of(default);
            let got = Kind::of(value);
            if got != expected {
                tracing::warn!(
                    key = %key,
                    expected = expected.name(),
                    got = got.name(),
                    "wrong value type in configuration"
                );
                continue;
            }
            if expected == Kind::Int && value.as_u64().is_none() {
                tracing::warn!(key = %key, "configuration value out of range");
                continue;
            }
            self.apply(key, value);
            accepted.insert(key.clone(), value.clone());

            if key == "domain" && self.cookie_domain.is_empty() {
                self.cookie_domain = self.domain.clone();
                accepted.insert("cookie_domain".into(), value.clone());
            }
        }
        accepted
    }

    // Keys and types were validated against DEFAULTS before this is called.
    fn apply(&mut self, key: &str, value: &Value) {
        match (key, value) {
            ("domain", Value::String(s)) => self.domain = s.clone(),
            ("cookie_name", Value::String(s)) => self.cookie_name = s.clone(),
            ("cookie_domain", Value::String(s)) => self.cookie_domain = s.clone(),
            ("cookie_path", Value::String(s)) => self.cookie_path = s.clone(),
            ("ping", Value::Bool(b)) => self.ping = *b,
            ("ping_interval", Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    self.ping_interval = v;
                }
            }
            ("idle_timeout", Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    self.idle_timeout = v;
                }
            }
            ("download_tracking", Value::Bool(b)) => self.download_tracking = *b,
            ("outgoing_tracking", Value::Bool(b)) => self.outgoing_tracking = *b,
            ("download_pause", Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    self.download_pause = v;
                }
            }
            ("outgoing_pause", Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    self.outgoing_pause = v;
                }
            }
            ("ignore_query_url", Value::Bool(b)) => self.ignore_query_url = *b,
            ("hide_campaign", Value::Bool(b)) => self.hide_campaign = *b,
            ("ip_address", Value::String(s)) => self.ip_address = s.clone(),
            ("cookie_value", Value::String(s)) => self.cookie_value = s.clone(),
            _ => {}
        }
    }
}

fn build_config(path: Option<&str>) -> Result<config::Config, config::ConfigError> {
    use config::{Config, Environment, File};
    let mut builder = Config::builder()
        .add_source(File::with_name("woopra").required(false))
        .add_source(Environment::with_prefix("WOOPRA").separator("__"));
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }
    builder.build()
}
