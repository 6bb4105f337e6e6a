use rand::Rng;
use time::format_description::well_known::Rfc2822;
use time::{Duration, OffsetDateTime};

use crate::config::TrackerConfig;
use crate::error::TrackerError;

const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const VALUE_LEN: usize = 12;

/// Two years, the expiry the Woopra cookie ships with.
const MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365 * 2;

/// Random visitor id for first-time visitors. A hash of the visitor's
/// email is a better id when one is available.
pub fn random_cookie_value() -> String {
    let mut rng = rand::thread_rng();
    (0..VALUE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// `Set-Cookie` header value for the configured cookie. Callers attach it
/// to their response before headers are flushed.
pub fn set_cookie_header(config: &TrackerConfig) -> Result<String, TrackerError> {
    let expires = (OffsetDateTime::now_utc() + Duration::seconds(MAX_AGE_SECS)).format(&Rfc2822)?;
    let mut header = format!(
        "{}={}; Max-Age={}; Expires={}; Path={}",
        config.cookie_name, config.cookie_value, MAX_AGE_SECS, expires, config.cookie_path
    );
    if !config.cookie_domain.is_empty() {
        header.push_str("; Domain=");
        header.push_str(&config.cookie_domain);
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_value_is_12_uppercase_alphanumerics() {
        let value = random_cookie_value();
        assert_eq!(value.len(), 12);
        assert!(value.bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn header_has_name_value_expiry_and_path() {
        let mut config = TrackerConfig::default();
        config.cookie_value = "AAAABBBBCCCC".into();
        let header = set_cookie_header(&config).unwrap();

        assert!(header.starts_with("wooTracker=AAAABBBBCCCC; "));
        assert!(header.contains("Max-Age=63072000"));
        assert!(header.contains("Expires="));
        assert!(header.contains("Path=/"));
        assert!(!header.contains("Domain="));
    }

    #[test]
    fn header_includes_domain_when_scoped() {
        let mut config = TrackerConfig::default();
        config.cookie_value = "AAAABBBBCCCC".into();
        config.cookie_domain = "ralphsamuel.io".into();

        let header = set_cookie_header(&config).unwrap();
        assert!(header.ends_with("; Domain=ralphsamuel.io"));
    }
}
