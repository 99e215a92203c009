use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hackathon_aggregator::{
    AggregatorError, CuratedSource, DevPostListing, HackathonRecord, PipelineBuilder,
    PipelineConfig, PublishOutcome, RawRecord, Result, Source, SourceAdapter, Status,
};
use std::sync::Once;
use std::time::Duration;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

/// Serves a fixed batch of records.
struct StaticSource {
    source: Source,
    records: Vec<RawRecord>,
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}

struct FailingSource(Source);

#[async_trait]
impl SourceAdapter for FailingSource {
    fn source(&self) -> Source {
        self.0
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        Err(AggregatorError::SourceUnavailable {
            adapter: self.0,
            reason: "connection refused".to_string(),
        })
    }
}

struct SlowSource(Source);

#[async_trait]
impl SourceAdapter for SlowSource {
    fn source(&self) -> Source {
        self.0
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(Vec::new())
    }
}

const CURATED: &str = r#"[
    {
        "name": "ai global challenge 2025",
        "description": "Build with AI",
        "start_date": "2025-02-15T00:00:00Z",
        "end_date": "2025-02-17T23:59:59Z",
        "location": "Global/Virtual",
        "type": "online",
        "organizer": "AI Org",
        "tags": ["AI"]
    },
    {
        "name": "Spring Build Week",
        "start_date": "2025-03-03",
        "end_date": "2025-03-07",
        "location": "Berlin, Germany",
        "type": "in-person",
        "prizePool": "$2,000",
        "website_link": "https://spring.example.org"
    },
    {
        "name": "Backwards Hack",
        "start_date": "2025-04-10",
        "end_date": "2025-04-01"
    }
]"#;

fn devpost_listing() -> RawRecord {
    RawRecord::DevPost(DevPostListing {
        title: "AI Global Challenge 2025".to_string(),
        submission_period: "Feb 15 - 17, 2025".to_string(),
        location: "Online".to_string(),
        prize: "$10,000".to_string(),
        themes: vec!["Machine Learning/AI".to_string()],
        url: Some("https://ai-global.devpost.com/".to_string()),
        host: "AI Org".to_string(),
        description: String::new(),
    })
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 16, 12, 0, 0).unwrap()
}

fn read_published(config: &PipelineConfig) -> Vec<HackathonRecord> {
    let json = std::fs::read_to_string(config.output_dir.join("hackathons.json")).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[tokio::test]
async fn failed_source_does_not_block_publishing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        output_dir: dir.path().join("data"),
        ..Default::default()
    };

    let pipeline = PipelineBuilder::new()
        .config(config.clone())
        .add_source(Box::new(StaticSource {
            source: Source::DevPost,
            records: vec![devpost_listing()],
        }))
        .add_source(Box::new(FailingSource(Source::Mlh)))
        .add_source(Box::new(CuratedSource::from_json(CURATED)))
        .build();

    let report = pipeline.run(now()).await.unwrap();
    info!("Run report: {:?}", report.summary);

    assert_eq!(report.outcome, PublishOutcome::Published { records: 2 });
    assert_eq!(report.summary.fetched, 4);
    assert_eq!(report.summary.discarded, 1);
    assert_eq!(report.summary.merged, 1);
    assert_eq!(report.summary.failed_sources, vec![Source::Mlh]);
    assert_eq!(report.summary.active, 1);
    assert_eq!(report.summary.upcoming, 1);

    let published = read_published(&config);
    assert_eq!(published.len(), 2);

    let merged = &published[0];
    assert_eq!(merged.title, "AI Global Challenge 2025");
    assert_eq!(merged.source, Source::DevPost);
    assert_eq!(merged.prize_pool, "$10,000");
    assert_eq!(merged.status, Status::Active);

    let spring = &published[1];
    assert_eq!(spring.title, "Spring Build Week");
    assert_eq!(spring.source, Source::Curated);
    assert_eq!(spring.status, Status::Upcoming);

    let stamp = std::fs::read_to_string(config.output_dir.join("last_update.txt")).unwrap();
    assert_eq!(stamp, "2025-02-16T12:00:00Z\n");
}

#[tokio::test]
async fn identical_second_run_is_a_no_op() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let pipeline = PipelineBuilder::new()
        .config(config.clone())
        .add_source(Box::new(CuratedSource::from_json(CURATED)))
        .build();

    let first = pipeline.run(now()).await.unwrap();
    assert_eq!(first.outcome, PublishOutcome::Published { records: 2 });

    let later = Utc.with_ymd_and_hms(2025, 2, 16, 18, 0, 0).unwrap();
    let second = pipeline.run(later).await.unwrap();
    assert_eq!(second.outcome, PublishOutcome::Unchanged);
    assert_ne!(first.run_id, second.run_id);

    let stamp = std::fs::read_to_string(dir.path().join("last_update.txt")).unwrap();
    assert_eq!(stamp, "2025-02-16T12:00:00Z\n");
}

#[tokio::test]
async fn slow_source_times_out_and_run_still_publishes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        output_dir: dir.path().to_path_buf(),
        source_timeout_seconds: 1,
        ..Default::default()
    };

    let pipeline = PipelineBuilder::new()
        .config(config.clone())
        .add_source(Box::new(SlowSource(Source::Mlh)))
        .add_source(Box::new(CuratedSource::from_json(CURATED)))
        .build();

    let report = pipeline.run(now()).await.unwrap();
    assert_eq!(report.summary.failed_sources, vec![Source::Mlh]);
    assert_eq!(report.summary.per_source.get(&Source::Mlh), None);
    assert_eq!(read_published(&config).len(), 2);
}

#[tokio::test]
async fn all_sources_failing_publishes_an_empty_array() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let pipeline = PipelineBuilder::new()
        .config(config.clone())
        .add_source(Box::new(FailingSource(Source::DevPost)))
        .add_source(Box::new(FailingSource(Source::Mlh)))
        .build();

    let report = pipeline.run(now()).await.unwrap();
    assert_eq!(report.outcome, PublishOutcome::Published { records: 0 });
    assert_eq!(report.summary.failed_sources.len(), 2);
    assert!(read_published(&config).is_empty());
}

#[tokio::test]
async fn unwritable_output_is_the_only_fatal_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("data");
    std::fs::write(&blocker, "occupied").unwrap();
    let config = PipelineConfig {
        output_dir: blocker,
        ..Default::default()
    };

    let pipeline = PipelineBuilder::new()
        .config(config)
        .add_source(Box::new(CuratedSource::from_json(CURATED)))
        .build();

    let result = pipeline.run(now()).await;
    assert!(matches!(result, Err(AggregatorError::Publish { .. })));
}
