use std::path::PathBuf;

use serde::Deserialize;

pub use interfaces::defs::{EventType, HackathonRecord, Source, Status};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_body_size_mb: usize,
    pub max_redirects: usize,
    pub min_host_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Hackathon-Aggregator/1.0".to_string(),
            timeout_seconds: 20,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_body_size_mb: 10,
            max_redirects: 5,
            min_host_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    /// Upper bound on one adapter's whole fetch, retries included.
    pub source_timeout_seconds: u64,
    pub fetch: FetchConfig,
    pub devpost_url: String,
    pub devpost_max_pages: usize,
    pub mlh_url: String,
    pub skip_sources: Vec<Source>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            source_timeout_seconds: 30,
            fetch: FetchConfig::default(),
            devpost_url: "https://devpost.com/hackathons".to_string(),
            devpost_max_pages: 3,
            mlh_url: "https://mlh.io/api/v1/events".to_string(),
            skip_sources: Vec::new(),
        }
    }
}

/// A listing as scraped from a DevPost hackathons page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevPostListing {
    pub title: String,
    /// e.g. `Feb 15 - 17, 2025`
    pub submission_period: String,
    pub location: String,
    pub prize: String,
    pub themes: Vec<String>,
    pub url: Option<String>,
    pub host: String,
    pub description: String,
}

/// One element of the MLH events feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlhEvent {
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default, alias = "website", alias = "websiteUrl")]
    pub url: Option<String>,
    #[serde(alias = "start_date", alias = "startsAt")]
    pub start_date: String,
    #[serde(alias = "end_date", alias = "endsAt")]
    pub end_date: String,
    #[serde(default)]
    pub location: Option<MlhLocation>,
    #[serde(default, alias = "format", alias = "eventType")]
    pub format_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "registration_url")]
    pub registration_url: Option<String>,
    #[serde(default, alias = "registration_deadline")]
    pub registration_deadline: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "prizePool")]
    pub prize: Option<String>,
}

/// MLH sometimes sends a structured venue and sometimes a display string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MlhLocation {
    Text(String),
    Venue {
        #[serde(default)]
        city: Option<String>,
        #[serde(default)]
        state: Option<String>,
        #[serde(default)]
        country: Option<String>,
    },
}

impl MlhLocation {
    pub fn display(&self) -> String {
        match self {
            MlhLocation::Text(text) => text.clone(),
            MlhLocation::Venue { city, state, country } => [city, state, country]
                .into_iter()
                .flatten()
                .map(|part| part.trim())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// An entry of the in-repository curated list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CuratedEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub registration_deadline: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default, rename = "prizePool")]
    pub prize_pool: String,
    #[serde(default)]
    pub registration_link: Option<String>,
    #[serde(default)]
    pub website_link: Option<String>,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A record in the native shape of the source that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    DevPost(DevPostListing),
    Mlh(MlhEvent),
    Curated(CuratedEntry),
}

impl RawRecord {
    pub fn source(&self) -> Source {
        match self {
            RawRecord::DevPost(_) => Source::DevPost,
            RawRecord::Mlh(_) => Source::Mlh,
            RawRecord::Curated(_) => Source::Curated,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            RawRecord::DevPost(listing) => &listing.title,
            RawRecord::Mlh(event) => &event.name,
            RawRecord::Curated(entry) => &entry.name,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{adapter} unavailable: {reason}")]
    SourceUnavailable { adapter: Source, reason: String },

    #[error("{adapter} did not finish within {seconds}s")]
    Timeout { adapter: Source, seconds: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Response size exceeds limit: {size_mb}MB")]
    BodyTooLarge { size_mb: usize },

    #[error("Failed to publish {path:?}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

impl AggregatorError {
    pub(crate) fn publish(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AggregatorError::Publish {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
