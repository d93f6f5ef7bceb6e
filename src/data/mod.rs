//! Core data models for the live-score dashboard
//!
//! This module contains the match types shared by the fetcher, the cache and
//! the UI, plus the API-Football client that produces them.

pub mod fixtures;

pub use fixtures::{FetchError, FixturesClient, LiveFixtures, Severity};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A live match as shown on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Provider fixture id
    pub id: u64,
    /// Home team name
    pub home_team: String,
    /// Away team name
    pub away_team: String,
    /// Home goals, if the provider reported a score
    pub home_score: Option<u32>,
    /// Away goals, if the provider reported a score
    pub away_score: Option<u32>,
    /// Minutes played, or half-time
    pub elapsed: Elapsed,
    /// League or cup name
    pub competition: String,
    /// Long status text, e.g. "Second Half"
    pub status: String,
    /// Match events in provider order
    pub events: Vec<Event>,
}

impl Match {
    /// Number of goal events
    pub fn goal_count(&self) -> usize {
        self.count_events(EventKind::Goal)
    }

    /// Number of card events
    pub fn card_count(&self) -> usize {
        self.count_events(EventKind::Card)
    }

    fn count_events(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }
}

/// Match clock as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ElapsedRepr", into = "ElapsedRepr")]
pub enum Elapsed {
    Minutes(u32),
    HalfTime,
}

impl Elapsed {
    /// Maps the provider's `fixture.status.elapsed`; no value (or zero) reads as half-time
    pub fn from_provider(elapsed: Option<u32>) -> Self {
        match elapsed {
            Some(minutes) if minutes > 0 => Elapsed::Minutes(minutes),
            _ => Elapsed::HalfTime,
        }
    }
}

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Elapsed::Minutes(minutes) => write!(f, "{}'", minutes),
            Elapsed::HalfTime => write!(f, "HT'"),
        }
    }
}

/// Wire form of `Elapsed`: an integer or the string "HT"
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ElapsedRepr {
    Minutes(u32),
    Text(String),
}

impl TryFrom<ElapsedRepr> for Elapsed {
    type Error = String;

    fn try_from(repr: ElapsedRepr) -> Result<Self, Self::Error> {
        match repr {
            ElapsedRepr::Minutes(minutes) => Ok(Elapsed::Minutes(minutes)),
            ElapsedRepr::Text(text) if text == "HT" => Ok(Elapsed::HalfTime),
            ElapsedRepr::Text(text) => Err(format!("invalid elapsed value: {}", text)),
        }
    }
}

impl From<Elapsed> for ElapsedRepr {
    fn from(elapsed: Elapsed) -> Self {
        match elapsed {
            Elapsed::Minutes(minutes) => ElapsedRepr::Minutes(minutes),
            Elapsed::HalfTime => ElapsedRepr::Text("HT".to_string()),
        }
    }
}

/// A match event. Only the type is interpreted; the rest of the provider
/// payload is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: EventKind,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event types the dashboard aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventKind {
    Goal,
    Card,
    #[default]
    #[serde(other)]
    Other,
}

/// Reads an event `type` of any shape; anything but a known string is `Other`
fn lenient_kind<'de, D>(deserializer: D) -> Result<EventKind, D::Error>
where
    D: Deserializer<'de>,
{
    let kind = match Value::deserialize(deserializer)? {
        Value::String(text) if text == "Goal" => EventKind::Goal,
        Value::String(text) if text == "Card" => EventKind::Card,
        _ => EventKind::Other,
    };
    Ok(kind)
}
