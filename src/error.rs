#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("invalid beacon url: {0}")]
    Url(#[from] url::ParseError),
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cookie expiry formatting: {0}")]
    CookieExpiry(#[from] time::error::Format),
}
