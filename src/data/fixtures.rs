//! API-Football live fixtures client
//!
//! Fetches `/fixtures?live=all`, classifies every failure into a `FetchError`
//! once at this boundary, and maps raw fixtures into `Match` values. The
//! client never touches rate-limit or cache state; it hands the parsed
//! headers back to the caller.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Elapsed, Event, Match};
use crate::rate_limit::RateLimitState;

/// Base URL for the API-Football v3 API
pub const API_FOOTBALL_BASE_URL: &str = "https://v3.football.api-sports.io";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "x-apisports-key";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

const INVALID_KEY_MESSAGE: &str = "Invalid API key. Check your .env file.";
const NETWORK_MESSAGE: &str = "Network error. Check your internet connection.";
const DEFAULT_MESSAGE: &str = "Failed to load matches. Try again later.";

/// Why a fetch failed, as far as the user is concerned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The provider answered 429
    #[error("rate limited by provider")]
    RateLimited {
        /// Reset instant from `x-ratelimit-reset`, in epoch milliseconds
        reset_at_ms: Option<i64>,
    },

    /// The provider answered 403, or no key is configured
    #[error("invalid API key")]
    InvalidKey,

    /// No response was received
    #[error("network error")]
    Network,

    /// The body carried provider-level error messages
    #[error("provider error: {message}")]
    Provider {
        message: String,
        /// Headers of a 2xx response that still carried `errors`
        rate_limit: Option<RateLimitState>,
    },

    /// Anything else
    #[error("{0}")]
    Unknown(String),
}

/// How an error banner should be styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Temporary condition with a retry affordance
    Warning,
    /// Everything else
    Critical,
}

impl FetchError {
    /// Text shown in the error banner.
    ///
    /// `rate_limit` is the tracker state after the failure was applied, so a
    /// 429 reports the real wait time.
    pub fn user_message(&self, rate_limit: &RateLimitState, now_ms: i64) -> String {
        match self {
            FetchError::RateLimited { .. } => format!(
                "Too many requests! Please wait {}s before refreshing.",
                rate_limit.seconds_until_reset(now_ms)
            ),
            FetchError::InvalidKey => INVALID_KEY_MESSAGE.to_string(),
            FetchError::Network => NETWORK_MESSAGE.to_string(),
            FetchError::Provider { message, .. } => message.clone(),
            FetchError::Unknown(message) if message.trim().is_empty() => {
                DEFAULT_MESSAGE.to_string()
            }
            FetchError::Unknown(message) => message.clone(),
        }
    }

    /// Rate-limit headers of a response that completed but still failed
    pub fn rate_limit(&self) -> Option<RateLimitState> {
        match self {
            FetchError::Provider { rate_limit, .. } => *rate_limit,
            _ => None,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FetchError::RateLimited { .. } => Severity::Warning,
            _ => Severity::Critical,
        }
    }
}

/// A successful fetch: the mapped matches and the headers' rate-limit view
#[derive(Debug, Clone, PartialEq)]
pub struct LiveFixtures {
    pub matches: Vec<Match>,
    pub rate_limit: RateLimitState,
}

/// Client for the API-Football live fixtures endpoint
#[derive(Debug, Clone)]
pub struct FixturesClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FixturesClient {
    /// Creates a client against the public API with the default timeout
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        Self::with_options(api_key, API_FOOTBALL_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom base URL and request timeout
    pub fn with_options(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Fetches all fixtures currently in play
    ///
    /// # Returns
    /// * `Ok(LiveFixtures)` - Mapped matches plus the rate-limit headers
    /// * `Err(FetchError)` - Classified failure; see `FetchError`
    pub async fn fetch_live_matches(&self) -> Result<LiveFixtures, FetchError> {
        let Some(api_key) = self.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
            warn!("No API key configured, set API_FOOTBALL_KEY");
            return Err(FetchError::InvalidKey);
        };

        let url = format!("{}/fixtures?live=all", self.base_url.trim_end_matches('/'));
        debug!(%url, "Requesting live fixtures");

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let remaining = header_value(&response, REMAINING_HEADER);
        let reset = header_value(&response, RESET_HEADER);
        let body = response.text().await.map_err(classify_transport_error)?;

        parse_response(
            status,
            remaining.as_deref(),
            reset.as_deref(),
            &body,
            Utc::now().timestamp_millis(),
        )
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Connect failures and timeouts mean no response was received
fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        FetchError::Network
    } else {
        FetchError::Unknown(err.to_string())
    }
}

/// Classifies a received response and maps its fixtures.
///
/// Status codes win over body content: a 403 is an invalid key whatever the
/// provider wrote in the body.
fn parse_response(
    status: u16,
    remaining: Option<&str>,
    reset: Option<&str>,
    body: &str,
    now_ms: i64,
) -> Result<LiveFixtures, FetchError> {
    match status {
        429 => {
            let reset_at_ms = reset
                .and_then(|value| value.trim().parse::<i64>().ok())
                .and_then(|secs| secs.checked_mul(1000));
            return Err(FetchError::RateLimited { reset_at_ms });
        }
        403 => return Err(FetchError::InvalidKey),
        _ => {}
    }

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = provider_errors(&envelope.errors) {
            let rate_limit = (200..300)
                .contains(&status)
                .then(|| RateLimitState::from_headers(remaining, reset, now_ms));
            return Err(FetchError::Provider {
                message,
                rate_limit,
            });
        }
    }

    if !(200..300).contains(&status) {
        return Err(FetchError::Unknown(format!(
            "Request failed with status code {}",
            status
        )));
    }

    let api_response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Unknown(format!("Failed to parse API response: {}", e)))?;

    let matches = api_response.response.into_iter().map(map_fixture).collect();

    Ok(LiveFixtures {
        matches,
        rate_limit: RateLimitState::from_headers(remaining, reset, now_ms),
    })
}

/// Joins provider error messages. The provider sends an empty array when all
/// is well, and an object keyed by field when something is wrong.
fn provider_errors(errors: &Value) -> Option<String> {
    let messages: Vec<String> = match errors {
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::Object(fields) => fields.values().map(value_text).collect(),
        Value::String(text) => vec![text.clone()],
        _ => Vec::new(),
    };

    let messages: Vec<String> = messages.into_iter().filter(|m| !m.is_empty()).collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join(", "))
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn map_fixture(raw: RawFixture) -> Match {
    Match {
        id: raw.fixture.id,
        home_team: raw.teams.home.name,
        away_team: raw.teams.away.name,
        home_score: raw.goals.home,
        away_score: raw.goals.away,
        elapsed: Elapsed::from_provider(raw.fixture.status.elapsed),
        competition: raw.league.name,
        status: raw.fixture.status.long,
        events: raw.events.unwrap_or_default(),
    }
}

/// Just the `errors` field, readable from any status
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Value,
}

/// API-Football response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    response: Vec<RawFixture>,
}

#[derive(Debug, Deserialize)]
struct RawFixture {
    fixture: FixtureInfo,
    league: NamedEntity,
    teams: Teams,
    goals: Goals,
    #[serde(default)]
    events: Option<Vec<Event>>,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    id: u64,
    status: FixtureStatus,
}

#[derive(Debug, Deserialize)]
struct FixtureStatus {
    long: String,
    #[serde(default)]
    elapsed: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Teams {
    home: NamedEntity,
    away: NamedEntity,
}

#[derive(Debug, Deserialize)]
struct Goals {
    home: Option<u32>,
    away: Option<u32>,
}
