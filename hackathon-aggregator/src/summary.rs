use crate::listing_utils::prize::leading_amount;
use crate::types::{HackathonRecord, Source, Status};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

const TOP_TAG_COUNT: usize = 5;

/// Statistics about one pipeline run, computed after classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub active: usize,
    pub upcoming: usize,
    pub ended: usize,
    pub per_source: BTreeMap<Source, usize>,
    pub fetched: usize,
    pub discarded: usize,
    pub merged: usize,
    pub failed_sources: Vec<Source>,
    pub total_prize_pool: u64,
    pub average_duration_days: f64,
    pub top_tags: Vec<(String, usize)>,
}

/// Per-source counts gathered before the merge.
#[derive(Debug, Clone, Default)]
pub struct IntakeCounts {
    pub fetched: usize,
    pub discarded: usize,
    pub merged: usize,
    pub failed_sources: Vec<Source>,
}

impl RunSummary {
    pub fn compute(records: &[HackathonRecord], intake: IntakeCounts) -> Self {
        let mut summary = RunSummary {
            total: records.len(),
            fetched: intake.fetched,
            discarded: intake.discarded,
            merged: intake.merged,
            failed_sources: intake.failed_sources,
            ..Default::default()
        };

        let mut tag_counts: HashMap<&str, usize> = HashMap::new();
        let mut total_days = 0i64;

        for record in records {
            match record.status {
                Status::Active => summary.active += 1,
                Status::Upcoming => summary.upcoming += 1,
                Status::Ended => summary.ended += 1,
            }
            *summary.per_source.entry(record.source).or_insert(0) += 1;
            summary.total_prize_pool = summary
                .total_prize_pool
                .saturating_add(leading_amount(&record.prize_pool));
            total_days += record.duration_days();
            for tag in &record.tags {
                *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        if !records.is_empty() {
            summary.average_duration_days = total_days as f64 / records.len() as f64;
        }

        let mut tags: Vec<(String, usize)> = tag_counts
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tags.truncate(TOP_TAG_COUNT);
        summary.top_tags = tags;

        summary
    }

    pub fn log(&self) {
        info!(
            "Run summary: {} records ({} active, {} upcoming, {} ended)",
            self.total, self.active, self.upcoming, self.ended
        );
        for (source, count) in &self.per_source {
            info!("  {}: {} records", source, count);
        }
        info!(
            "  fetched {}, discarded {}, merged {}",
            self.fetched, self.discarded, self.merged
        );
        if !self.failed_sources.is_empty() {
            let failed: Vec<&str> = self.failed_sources.iter().map(|s| s.as_str()).collect();
            info!("  failed sources: {}", failed.join(", "));
        }
        info!(
            "  total prize pool ${}, average duration {:.1} days",
            self.total_prize_pool, self.average_duration_days
        );
        if !self.top_tags.is_empty() {
            let tags: Vec<String> = self
                .top_tags
                .iter()
                .map(|(tag, count)| format!("{} ({})", tag, count))
                .collect();
            info!("  top tags: {}", tags.join(", "));
        }
    }
}
