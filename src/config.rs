use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::cli::StartupConfig;
use crate::data::fixtures::{API_FOOTBALL_BASE_URL, DEFAULT_TIMEOUT};
use crate::refresh::DEFAULT_INTERVAL;

/// Environment variable holding the API-Football key
pub const API_KEY_VAR: &str = "API_FOOTBALL_KEY";
/// Older name still accepted for the key
pub const LEGACY_API_KEY_VAR: &str = "REACT_APP_API_FOOTBALL_KEY";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// API-Football key; `None` surfaces as an invalid-key error on first fetch
    pub api_key: Option<String>,

    /// API-Football base URL
    pub base_url: String,

    /// Time between automatic refreshes
    pub poll_interval: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            base_url: API_FOOTBALL_BASE_URL.to_string(),
            poll_interval: DEFAULT_INTERVAL,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_VAR)
            .or_else(|| lookup(LEGACY_API_KEY_VAR))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Config {
            api_key,

            base_url: lookup("API_FOOTBALL_BASE_URL")
                .unwrap_or_else(|| API_FOOTBALL_BASE_URL.to_string()),

            poll_interval: seconds_var(
                &lookup,
                "LIVESCORE_POLL_INTERVAL",
                DEFAULT_INTERVAL.as_secs(),
            )?,

            request_timeout: seconds_var(&lookup, "LIVESCORE_TIMEOUT", DEFAULT_TIMEOUT.as_secs())?,
        })
    }

    /// Applies command-line overrides on top of the environment
    pub fn apply(&mut self, startup: &StartupConfig) {
        if let Some(base_url) = &startup.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(interval) = startup.poll_interval {
            self.poll_interval = interval;
        }
        if let Some(timeout) = startup.request_timeout {
            self.request_timeout = timeout;
        }
    }
}

fn seconds_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<Duration> {
    let secs: u64 = match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid number"))?,
        None => default,
    };
    if secs == 0 {
        bail!("{name} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_reads_primary_key() {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "abc"),
            (LEGACY_API_KEY_VAR, "legacy"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_falls_back_to_legacy_key() {
        let config = Config::from_lookup(lookup_from(&[(LEGACY_API_KEY_VAR, "legacy")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("legacy"));
    }

    #[test]
    fn test_blank_key_is_none() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_custom_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_FOOTBALL_BASE_URL", "http://127.0.0.1:9000"),
            ("LIVESCORE_POLL_INTERVAL", "60"),
            ("LIVESCORE_TIMEOUT", "3"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = Config::from_lookup(lookup_from(&[("LIVESCORE_POLL_INTERVAL", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("LIVESCORE_POLL_INTERVAL"));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let err = Config::from_lookup(lookup_from(&[("LIVESCORE_TIMEOUT", "0")])).unwrap_err();
        assert_eq!(err.to_string(), "LIVESCORE_TIMEOUT must be greater than zero");
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = Config::from_lookup(lookup_from(&[("LIVESCORE_POLL_INTERVAL", "60")]))
            .unwrap();
        let startup = StartupConfig {
            base_url: Some("http://localhost:1".to_string()),
            poll_interval: Some(Duration::from_secs(15)),
            ..Default::default()
        };

        config.apply(&startup);

        assert_eq!(config.base_url, "http://localhost:1");
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
    }
}
