use crate::traits::SourceAdapter;
use crate::types::{CuratedEntry, RawRecord, Result, Source};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

const EMBEDDED_LIST: &str = include_str!("../../data/curated.json");

/// Hand-maintained hackathons shipped with the binary.
pub struct CuratedSource {
    document: String,
}

impl CuratedSource {
    pub fn new() -> Self {
        Self::from_json(EMBEDDED_LIST)
    }

    pub fn from_json(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

impl Default for CuratedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for CuratedSource {
    fn source(&self) -> Source {
        Source::Curated
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let entries = parse_curated(&self.document);
        info!("Loaded {} curated hackathons", entries.len());
        Ok(entries.into_iter().map(RawRecord::Curated).collect())
    }
}

/// Decode the curated list. A list that is not a JSON array yields nothing,
/// and entries that do not decode are skipped.
pub fn parse_curated(document: &str) -> Vec<CuratedEntry> {
    let items = match serde_json::from_str::<Value>(document) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            error!("Curated list is not a JSON array");
            return Vec::new();
        }
        Err(e) => {
            error!("Curated list is not valid JSON: {}", e);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping curated entry #{}: {}", index, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_list_decodes_completely() {
        let raw: Vec<Value> = serde_json::from_str(EMBEDDED_LIST).unwrap();
        let entries = parse_curated(EMBEDDED_LIST);
        assert!(!entries.is_empty());
        assert_eq!(entries.len(), raw.len());
        assert!(entries.iter().any(|e| e.name == "Hacktoberfest 2025"));
    }

    #[test]
    fn skips_entries_missing_required_fields() {
        let document = r#"[
            {"name": "Complete", "start_date": "2025-03-01", "end_date": "2025-03-02", "prizePool": "$5,000"},
            {"name": "Dateless"}
        ]"#;
        let entries = parse_curated(document);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].prize_pool, "$5,000");
        assert_eq!(entries[0].event_type, None);
    }

    #[tokio::test]
    async fn broken_list_is_empty_not_an_error() {
        let source = CuratedSource::from_json("{ not json");
        let records = source.fetch().await.unwrap();
        assert!(records.is_empty());

        let source = CuratedSource::from_json(r#"{"hackathons": []}"#);
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
