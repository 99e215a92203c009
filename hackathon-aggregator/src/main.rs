use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use hackathon_aggregator::{Pipeline, PipelineConfig, PublishOutcome, Source};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "hackathon-aggregator", about = "Collect hackathon listings into one JSON artifact")]
struct Args {
    /// Directory receiving hackathons.json and last_update.txt
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// Upper bound on each source's fetch
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long)]
    devpost_url: Option<String>,

    /// Number of DevPost listing pages to walk
    #[arg(long)]
    devpost_pages: Option<usize>,

    #[arg(long)]
    mlh_url: Option<String>,

    /// Leave a source out of the run (devpost, mlh, curated)
    #[arg(long = "skip", value_name = "SOURCE")]
    skip: Vec<Source>,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            output_dir: self.output_dir,
            source_timeout_seconds: self.timeout_secs,
            devpost_url: self.devpost_url.unwrap_or(defaults.devpost_url),
            devpost_max_pages: self.devpost_pages.unwrap_or(defaults.devpost_max_pages),
            mlh_url: self.mlh_url.unwrap_or(defaults.mlh_url),
            skip_sources: self.skip,
            fetch: defaults.fetch,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting Hackathon Aggregator");

    let config = args.into_config();
    let pipeline = Pipeline::from_config(&config).context("Failed to set up the pipeline")?;

    let report = pipeline.run(Utc::now()).await.map_err(|e| {
        error!("Publish failed: {}", e);
        e
    })?;

    match report.outcome {
        PublishOutcome::Unchanged => info!("Run {} finished, output unchanged", report.run_id),
        PublishOutcome::Published { records } => {
            info!("Run {} finished, published {} hackathons", report.run_id, records)
        }
    }

    Ok(())
}
