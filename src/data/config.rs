//! Client configuration.
//!
//! Everything the client needs is collected here once and validated before a
//! client is built. Request code never reads the process environment.

use std::fmt;
use std::time::Duration;

use crate::data::retry::RetryPolicy;
use crate::error::SeriesError;

pub const API_KEY_VAR: &str = "EIA_API_KEY";
pub const BASE_URL_VAR: &str = "EIA_BASE_URL";
pub const TIMEOUT_VAR: &str = "EIA_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.eia.gov/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Upstream page-size ceiling; one request never returns more rows.
pub const PAGE_LENGTH: usize = 5000;

const REGISTER_URL: &str = "https://www.eia.gov/opendata/register.php";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub page_length: usize,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Defaults for everything except the credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            page_length: PAGE_LENGTH,
            retry: RetryPolicy::default(),
        }
    }

    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, SeriesError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SeriesError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR).unwrap_or_default();
        let mut config = Self::new(api_key.trim());

        if let Some(url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_VAR).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SeriesError::Configuration(format!("{TIMEOUT_VAR} must be a whole number of seconds, got '{raw}'"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SeriesError> {
        if self.api_key.trim().is_empty() {
            return Err(SeriesError::Configuration(format!(
                "EIA API key is required. Set {API_KEY_VAR} in the environment (or .env). \
                 Get a free key at {REGISTER_URL}"
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(SeriesError::Configuration("EIA base URL must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(SeriesError::Configuration("request timeout must be > 0".to_string()));
        }
        if self.page_length == 0 {
            return Err(SeriesError::Configuration("page length must be > 0".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("page_length", &self.page_length)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = ClientConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, SeriesError::Configuration(ref m) if m.contains(API_KEY_VAR)));

        let err = ClientConfig::from_lookup(env(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, SeriesError::Configuration(_)));
    }

    #[test]
    fn defaults_and_overrides() {
        let config = ClientConfig::from_lookup(env(&[(API_KEY_VAR, "k")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.page_length, PAGE_LENGTH);
        assert_eq!(config.retry.max_attempts, 3);

        let config = ClientConfig::from_lookup(env(&[
            (API_KEY_VAR, "k"),
            (BASE_URL_VAR, "http://localhost:8080/v2/"),
            (TIMEOUT_VAR, "180"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/v2");
        assert_eq!(config.timeout, Duration::from_secs(180));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(env(&[(API_KEY_VAR, "k"), (TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, SeriesError::Configuration(ref m) if m.contains(TIMEOUT_VAR)));

        let err = ClientConfig::from_lookup(env(&[(API_KEY_VAR, "k"), (TIMEOUT_VAR, "0")])).unwrap_err();
        assert!(matches!(err, SeriesError::Configuration(_)));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = ClientConfig::new("super-secret");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
