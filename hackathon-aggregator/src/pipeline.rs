use crate::dedup::deduplicate;
use crate::fetcher::Fetcher;
use crate::normalizer::normalize;
use crate::publisher::{PublishOutcome, Publisher};
use crate::sources::default_sources;
use crate::status;
use crate::summary::{IntakeCounts, RunSummary};
use crate::traits::SourceAdapter;
use crate::types::{AggregatorError, HackathonRecord, PipelineConfig, RawRecord, Result, Source};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: PublishOutcome,
    pub summary: RunSummary,
}

/// Fetch, normalize, merge, classify and publish hackathon listings.
pub struct Pipeline {
    sources: Vec<Box<dyn SourceAdapter>>,
    publisher: Publisher,
    source_timeout: Duration,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            sources: Vec::new(),
            publisher: Publisher::new(&config.output_dir),
            source_timeout: Duration::from_secs(config.source_timeout_seconds),
        }
    }

    /// Pipeline over the production adapters, minus any skipped ones.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
        let mut pipeline = Self::new(config);
        for source in default_sources(config, fetcher) {
            pipeline.add_source(source);
        }
        Ok(pipeline)
    }

    pub fn add_source(&mut self, source: Box<dyn SourceAdapter>) {
        info!("Adding source to pipeline: {}", source.source_name());
        self.sources.push(source);
    }

    /// Run every stage once. Source failures and malformed records are
    /// absorbed; only a publish failure is returned as an error.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        info!("Starting run {} with {} sources", run_id, self.sources.len());

        let mut intake = IntakeCounts::default();
        let mut records: Vec<HackathonRecord> = Vec::new();

        for (source, fetched) in self.fetch_all().await {
            let raw = match fetched {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Source {} failed, continuing without it: {}", source, e);
                    intake.failed_sources.push(source);
                    continue;
                }
            };

            intake.fetched += raw.len();
            let (normalized, discarded) = normalize_all(&raw);
            info!(
                "{}: {} records, {} discarded",
                source,
                normalized.len(),
                discarded
            );
            intake.discarded += discarded;
            records.extend(normalized);
        }

        let deduped = deduplicate(records);
        info!("Merged {} duplicate records", deduped.merged);
        intake.merged = deduped.merged;

        let mut records = deduped.records;
        status::apply(&mut records, now);

        let summary = RunSummary::compute(&records, intake);
        let outcome = self.publisher.publish(records, now)?;
        summary.log();

        Ok(RunReport {
            run_id,
            outcome,
            summary,
        })
    }

    /// Fetch all adapters concurrently, each bounded by the source timeout.
    async fn fetch_all(&self) -> Vec<(Source, Result<Vec<RawRecord>>)> {
        let seconds = self.source_timeout.as_secs();
        let fetches = self.sources.iter().map(|adapter| async move {
            let source = adapter.source();
            let result = match tokio::time::timeout(self.source_timeout, adapter.fetch()).await {
                Ok(result) => result,
                Err(_) => Err(AggregatorError::Timeout {
                    adapter: source,
                    seconds,
                }),
            };
            (source, result)
        });
        join_all(fetches).await
    }
}

fn normalize_all(raw: &[RawRecord]) -> (Vec<HackathonRecord>, usize) {
    let mut discarded = 0;
    let records = raw
        .iter()
        .filter_map(|item| match normalize(item) {
            Ok(record) => Some(record),
            Err(reason) => {
                debug!("Discarding {} record '{}': {}", item.source(), item.title(), reason);
                discarded += 1;
                None
            }
        })
        .collect();
    (records, discarded)
}

/// Builder for assembling a pipeline from individual adapters.
pub struct PipelineBuilder {
    config: PipelineConfig,
    sources: Vec<Box<dyn SourceAdapter>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            sources: Vec::new(),
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_source(mut self, source: Box<dyn SourceAdapter>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> Pipeline {
        let mut pipeline = Pipeline::new(&self.config);
        for source in self.sources {
            pipeline.add_source(source);
        }
        pipeline
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
