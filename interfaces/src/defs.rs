use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where a listing came from. The order of the variants is the merge
/// priority used when two sources describe the same event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    DevPost,
    #[serde(rename = "MLH")]
    Mlh,
    Curated,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::DevPost, Source::Mlh, Source::Curated];

    /// Lower is preferred.
    pub fn priority(self) -> u8 {
        match self {
            Source::DevPost => 0,
            Source::Mlh => 1,
            Source::Curated => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::DevPost => "DevPost",
            Source::Mlh => "MLH",
            Source::Curated => "Curated",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devpost" => Ok(Source::DevPost),
            "mlh" => Ok(Source::Mlh),
            "curated" => Ok(Source::Curated),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "in-person")]
    InPerson,
}

impl EventType {
    /// Recognizes the spellings sources use for the event format.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_lowercase().replace(['_', '-'], " ");
        match hint.as_str() {
            "online" | "virtual" | "digital" | "remote" => Some(EventType::Online),
            "hybrid" => Some(EventType::Hybrid),
            "in person" | "inperson" | "physical" | "onsite" | "on site" => Some(EventType::InPerson),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventType::Online => "online",
            EventType::Hybrid => "hybrid",
            EventType::InPerson => "in-person",
        })
    }
}

/// Lifecycle of an event relative to the time of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Upcoming,
    Ended,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Active => "active",
            Status::Upcoming => "upcoming",
            Status::Ended => "ended",
        })
    }
}

/// One hackathon in the published `hackathons.json` array.
///
/// Every key is always serialized. Optional values that are absent are
/// written as `""` so the frontend only has to handle one empty form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackathonRecord {
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, with = "blank_as_none")]
    pub registration_deadline: Option<NaiveDate>,
    pub location: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub prize_pool: String,
    pub status: Status,
    pub tags: BTreeSet<String>,
    #[serde(default, with = "blank_as_none")]
    pub registration_url: Option<Url>,
    #[serde(default, with = "blank_as_none")]
    pub website_url: Option<Url>,
    pub organizer: String,
    pub source: Source,
}

impl HackathonRecord {
    /// Number of optional display fields that carry a value. Used to pick the
    /// richer variant when two sources list the same event.
    pub fn populated_optional_fields(&self) -> usize {
        [
            !self.description.is_empty(),
            !self.prize_pool.is_empty(),
            self.registration_url.is_some(),
            self.website_url.is_some(),
        ]
        .into_iter()
        .filter(|populated| *populated)
        .count()
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Serializes `None` as `""` and reads `""`, `null` or a missing key back as
/// `None`.
pub mod blank_as_none {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
