//! Maps each source's native record into the canonical [`HackathonRecord`].
//!
//! All date leniency lives here behind [`try_parse_date`] and
//! [`try_parse_date_range`]; adapters hand over date text untouched.

use crate::listing_utils::text::{collapse_whitespace, strip_html};
use crate::listing_utils::url::parse_http_url;
use crate::types::{
    CuratedEntry, DevPostListing, EventType, HackathonRecord, MlhEvent, RawRecord, Status,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Why a raw record was dropped instead of normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecord {
    #[error("record has no title")]
    MissingTitle,

    #[error("unparseable {field}: {text:?}")]
    UnparseableDate { field: &'static str, text: String },

    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// US month-first before day-first: both listing platforms are US based.
// `%B` and `%b` each accept the full and the abbreviated month name.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d-%m-%Y",
];

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"));

static WEEKDAY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)[a-z]*\.?,?\s+")
        .expect("valid weekday regex")
});

// chrono reads `Sep` and `September` but not `Sept`
static SEPT_ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsept\b\.?").expect("valid month abbreviation regex"));

static EMBEDDED_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid ISO date regex"));

// `Feb 15 - 17, 2025`
static SAME_MONTH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})\s*[-–—]\s*(\d{1,2}),?\s+(\d{4})$")
        .expect("valid same-month range regex")
});

// `Jan 30 - Mar 03, 2025`
static CROSS_MONTH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})\s*[-–—]\s*([A-Za-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})$")
        .expect("valid cross-month range regex")
});

const RANGE_SEPARATORS: &[&str] = &[" - ", " – ", " — ", " to ", " until "];

fn clean_date_text(text: &str) -> String {
    let text = collapse_whitespace(text);
    let text = WEEKDAY_PREFIX.replace(&text, "");
    let text = SEPT_ABBREVIATION.replace_all(&text, "Sep");
    ORDINAL_SUFFIX.replace_all(&text, "$1").into_owned()
}

/// Parse a calendar date out of any of the textual forms sources use.
///
/// Timestamps carrying an offset are converted to UTC before the date is
/// taken. Zone-less values are taken to already be UTC.
pub fn try_parse_date(text: &str) -> Option<NaiveDate> {
    let text = clean_date_text(text);
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&text, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, fmt) {
            return Some(date);
        }
    }

    let caps = EMBEDDED_ISO_DATE.captures(&text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse the date-range strings listing pages show, e.g. `Feb 15 - 17, 2025`,
/// `Jan 30 - Mar 03, 2025` or `Dec 28, 2024 - Jan 05, 2025`. A single date is
/// read as a one-day event.
pub fn try_parse_date_range(text: &str) -> Option<(NaiveDate, NaiveDate)> {
    let text = clean_date_text(text);
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = SAME_MONTH_RANGE.captures(&text) {
        let (month, year) = (&caps[1], &caps[4]);
        let start = try_parse_date(&format!("{} {}, {}", month, &caps[2], year))?;
        let end = try_parse_date(&format!("{} {}, {}", month, &caps[3], year))?;
        return Some((start, end));
    }

    if let Some(caps) = CROSS_MONTH_RANGE.captures(&text) {
        let year: i32 = caps[5].parse().ok()?;
        let end = try_parse_date(&format!("{} {}, {}", &caps[3], &caps[4], year))?;
        let start = try_parse_date(&format!("{} {}, {}", &caps[1], &caps[2], year))?;
        // `Dec 28 - Jan 05, 2025` starts in the previous year
        if start > end {
            let start = try_parse_date(&format!("{} {}, {}", &caps[1], &caps[2], year - 1))?;
            return Some((start, end));
        }
        return Some((start, end));
    }

    for separator in RANGE_SEPARATORS {
        if let Some((left, right)) = text.split_once(separator) {
            if let (Some(start), Some(end)) = (try_parse_date(left), try_parse_date(right)) {
                return Some((start, end));
            }
        }
    }

    try_parse_date(&text).map(|date| (date, date))
}

const ONLINE_INDICATORS: &[&str] = &[
    "online", "virtual", "remote", "digital", "zoom", "discord", "livestream", "worldwide",
    "anywhere", "everywhere", "global", "internet",
];

const PHYSICAL_TOKENS: &[&str] = &[
    "street", "st", "avenue", "ave", "road", "rd", "blvd", "boulevard", "hall", "center",
    "centre", "campus", "university", "college", "building", "floor", "suite", "venue",
    "convention", "hotel", "office",
];

/// Separators between the parts of a combined location such as
/// `Online & San Francisco, CA`
const LOCATION_PART_SEPARATORS: &[char] = &[',', '/', '&', '|', '+', ';'];

fn location_words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn has_online_indicator(words: &[&str]) -> bool {
    words.iter().any(|w| ONLINE_INDICATORS.contains(w))
}

/// Guess the event format from free-text location when a source does not
/// say. An online indicator together with a physical place reads as hybrid.
/// The place is either a venue token or a separate location part that names
/// somewhere without any online indicator.
pub fn infer_event_type(location: &str) -> EventType {
    let lowered = location.to_lowercase();
    let words = location_words(&lowered);

    if words.is_empty() {
        return EventType::Online;
    }
    if !has_online_indicator(&words) {
        // A bare place name like "Boston" is still a physical venue
        return EventType::InPerson;
    }

    let venue_token = words.iter().any(|w| PHYSICAL_TOKENS.contains(w));
    let place_part = lowered.split(LOCATION_PART_SEPARATORS).any(|part| {
        let part_words = location_words(part);
        !has_online_indicator(&part_words)
            && part_words
                .iter()
                .any(|w| w.chars().any(|c| c.is_alphabetic()))
    });

    if venue_token || place_part {
        EventType::Hybrid
    } else {
        EventType::Online
    }
}

/// Lowercase, whitespace-collapse and deduplicate labels.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| collapse_whitespace(&tag.as_ref().to_lowercase()))
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn clean_url(url: Option<&str>) -> Option<Url> {
    let url = url?;
    let parsed = parse_http_url(url);
    if parsed.is_none() && !url.trim().is_empty() {
        debug!("Dropping malformed URL: {:?}", url);
    }
    parsed
}

/// Source-independent view of a raw record before field parsing.
struct Fields<'a> {
    title: &'a str,
    description: &'a str,
    dates: DateInput<'a>,
    registration_deadline: Option<&'a str>,
    location: String,
    type_hint: Option<&'a str>,
    prize_pool: &'a str,
    tags: &'a [String],
    registration_url: Option<&'a str>,
    website_url: Option<&'a str>,
    organizer: &'a str,
}

enum DateInput<'a> {
    Range(&'a str),
    Separate { start: &'a str, end: &'a str },
}

impl<'a> Fields<'a> {
    fn from_devpost(listing: &'a DevPostListing) -> Self {
        Self {
            title: &listing.title,
            description: &listing.description,
            dates: DateInput::Range(&listing.submission_period),
            registration_deadline: None,
            location: listing.location.clone(),
            type_hint: None,
            prize_pool: &listing.prize,
            tags: &listing.themes,
            registration_url: listing.url.as_deref(),
            website_url: listing.url.as_deref(),
            organizer: &listing.host,
        }
    }

    fn from_mlh(event: &'a MlhEvent) -> Self {
        Self {
            title: &event.name,
            description: event.description.as_deref().unwrap_or_default(),
            dates: DateInput::Separate {
                start: &event.start_date,
                end: &event.end_date,
            },
            registration_deadline: event.registration_deadline.as_deref(),
            location: event.location.as_ref().map(|l| l.display()).unwrap_or_default(),
            type_hint: event.format_type.as_deref(),
            prize_pool: event.prize.as_deref().unwrap_or_default(),
            tags: &event.tags,
            registration_url: event.registration_url.as_deref().or(event.url.as_deref()),
            website_url: event.url.as_deref(),
            organizer: "Major League Hacking",
        }
    }

    fn from_curated(entry: &'a CuratedEntry) -> Self {
        Self {
            title: &entry.name,
            description: &entry.description,
            dates: DateInput::Separate {
                start: &entry.start_date,
                end: &entry.end_date,
            },
            registration_deadline: entry.registration_deadline.as_deref(),
            location: entry.location.clone(),
            type_hint: entry.event_type.as_deref(),
            prize_pool: &entry.prize_pool,
            tags: &entry.tags,
            registration_url: entry.registration_link.as_deref(),
            website_url: entry.website_link.as_deref(),
            organizer: &entry.organizer,
        }
    }

    fn date_range(&self) -> Result<(NaiveDate, NaiveDate), MalformedRecord> {
        match self.dates {
            DateInput::Range(text) => {
                try_parse_date_range(text).ok_or_else(|| MalformedRecord::UnparseableDate {
                    field: "dateRange",
                    text: text.to_string(),
                })
            }
            DateInput::Separate { start, end } => {
                let start = try_parse_date(start).ok_or_else(|| MalformedRecord::UnparseableDate {
                    field: "startDate",
                    text: start.to_string(),
                })?;
                let end = try_parse_date(end).ok_or_else(|| MalformedRecord::UnparseableDate {
                    field: "endDate",
                    text: end.to_string(),
                })?;
                Ok((start, end))
            }
        }
    }
}

/// Turn one raw record into the canonical schema, or say why it was dropped.
///
/// `status` is left as [`Status::Upcoming`]; the classifier owns that field
/// and overwrites it once the run's record set is final.
pub fn normalize(raw: &RawRecord) -> Result<HackathonRecord, MalformedRecord> {
    let fields = match raw {
        RawRecord::DevPost(listing) => Fields::from_devpost(listing),
        RawRecord::Mlh(event) => Fields::from_mlh(event),
        RawRecord::Curated(entry) => Fields::from_curated(entry),
    };

    let title = collapse_whitespace(fields.title);
    if title.is_empty() {
        return Err(MalformedRecord::MissingTitle);
    }

    let (start_date, end_date) = fields.date_range()?;
    if start_date > end_date {
        return Err(MalformedRecord::InvertedDateRange {
            start: start_date,
            end: end_date,
        });
    }

    let registration_deadline = fields
        .registration_deadline
        .and_then(|text| {
            let parsed = try_parse_date(text);
            if parsed.is_none() && !text.trim().is_empty() {
                debug!("Ignoring unparseable deadline {:?} for {}", text, title);
            }
            parsed
        })
        .filter(|deadline| {
            let valid = *deadline <= start_date;
            if !valid {
                debug!("Clearing deadline {} after start {} for {}", deadline, start_date, title);
            }
            valid
        });

    let location = collapse_whitespace(&fields.location);
    let event_type = fields
        .type_hint
        .and_then(EventType::from_hint)
        .unwrap_or_else(|| infer_event_type(&location));

    Ok(HackathonRecord {
        title,
        description: strip_html(fields.description),
        start_date,
        end_date,
        registration_deadline,
        location,
        event_type,
        prize_pool: collapse_whitespace(fields.prize_pool),
        status: Status::Upcoming,
        tags: normalize_tags(fields.tags),
        registration_url: clean_url(fields.registration_url),
        website_url: clean_url(fields.website_url),
        organizer: collapse_whitespace(fields.organizer),
        source: raw.source(),
    })
}
