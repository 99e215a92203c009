use crate::traits::{PageFetcher, SourceAdapter};
use crate::types::{AggregatorError, MlhEvent, RawRecord, Result, Source};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Major League Hacking season events, read from its JSON feed.
pub struct MlhSource {
    fetcher: Arc<dyn PageFetcher>,
    feed_url: String,
}

impl MlhSource {
    pub fn new(fetcher: Arc<dyn PageFetcher>, feed_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            feed_url: feed_url.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for MlhSource {
    fn source(&self) -> Source {
        Source::Mlh
    }

    fn source_name(&self) -> String {
        "MLH (Major League Hacking)".to_string()
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let fetched = self
            .fetcher
            .fetch_page(&self.feed_url)
            .await
            .map_err(|e| AggregatorError::SourceUnavailable {
                adapter: Source::Mlh,
                reason: e.to_string(),
            })?;

        let events = parse_events_json(&fetched.body)?;
        info!("Decoded {} MLH events", events.len());
        Ok(events.into_iter().map(RawRecord::Mlh).collect())
    }
}

/// Decode the feed document. The events array may be the document itself or
/// sit under `data` or `events`. Elements that do not decode are skipped.
pub fn parse_events_json(body: &str) -> Result<Vec<MlhEvent>> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| AggregatorError::Parse(format!("MLH feed is not JSON: {}", e)))?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut object) => match ["data", "events"]
            .iter()
            .find_map(|key| object.remove(*key).filter(Value::is_array))
        {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AggregatorError::Parse(
                    "MLH feed has no events array".to_string(),
                ))
            }
        },
        _ => {
            return Err(AggregatorError::Parse(
                "MLH feed has an unexpected shape".to_string(),
            ))
        }
    };

    let total = items.len();
    let events: Vec<MlhEvent> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<MlhEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Skipping MLH event #{}: {}", index, e);
                None
            }
        })
        .collect();

    if events.len() < total {
        debug!("Skipped {} undecodable MLH events", total - events.len());
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MlhLocation;

    #[test]
    fn decodes_wrapped_feed_and_skips_bad_elements() {
        let body = r#"{
            "data": [
                {
                    "name": "HackMIT",
                    "url": "https://hackmit.org",
                    "startDate": "2025-09-13",
                    "endDate": "2025-09-14",
                    "location": {"city": "Cambridge", "state": "MA"},
                    "formatType": "in-person"
                },
                {"name": "No Dates Hack"},
                42,
                {
                    "title": "Global Hack Week",
                    "startsAt": "2025-10-06T00:00:00Z",
                    "endsAt": "2025-10-12T23:59:59Z",
                    "location": "Everywhere, Online",
                    "format": "digital",
                    "tags": ["Beginner", "Open Source"]
                }
            ]
        }"#;

        let events = parse_events_json(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "HackMIT");
        assert_eq!(
            events[0].location,
            Some(MlhLocation::Venue {
                city: Some("Cambridge".to_string()),
                state: Some("MA".to_string()),
                country: None,
            })
        );
        assert_eq!(events[1].name, "Global Hack Week");
        assert_eq!(events[1].format_type.as_deref(), Some("digital"));
        assert_eq!(events[1].location, Some(MlhLocation::Text("Everywhere, Online".to_string())));
    }

    #[test]
    fn decodes_bare_array() {
        let body = r#"[{"name": "Hack", "start_date": "2025-01-01", "end_date": "2025-01-02"}]"#;
        let events = parse_events_json(body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location, None);
    }

    #[test]
    fn non_json_document_is_a_source_error() {
        assert!(matches!(
            parse_events_json("<html>maintenance</html>"),
            Err(AggregatorError::Parse(_))
        ));
        assert!(matches!(
            parse_events_json(r#"{"page": 1}"#),
            Err(AggregatorError::Parse(_))
        ));
    }
}
