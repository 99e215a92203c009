pub mod curated;
pub mod devpost;
pub mod mlh;

pub use curated::CuratedSource;
pub use devpost::DevPostSource;
pub use mlh::MlhSource;

use crate::fetcher::Fetcher;
use crate::traits::SourceAdapter;
use crate::types::{PipelineConfig, Source};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// DevPost pagination gets three quarters of the source timeout.
fn devpost_page_budget(config: &PipelineConfig) -> Duration {
    Duration::from_secs(config.source_timeout_seconds).mul_f64(0.75)
}

/// The three production adapters, minus any the configuration skips.
pub fn default_sources(config: &PipelineConfig, fetcher: Arc<Fetcher>) -> Vec<Box<dyn SourceAdapter>> {
    Source::ALL
        .into_iter()
        .filter(|source| {
            let skipped = config.skip_sources.contains(source);
            if skipped {
                info!("Skipping source {}", source);
            }
            !skipped
        })
        .map(|source| -> Box<dyn SourceAdapter> {
            match source {
                Source::DevPost => Box::new(
                    DevPostSource::new(
                        fetcher.clone(),
                        config.devpost_url.clone(),
                        config.devpost_max_pages,
                    )
                    .with_page_budget(devpost_page_budget(config)),
                ),
                Source::Mlh => Box::new(MlhSource::new(fetcher.clone(), config.mlh_url.clone())),
                Source::Curated => Box::new(CuratedSource::new()),
            }
        })
        .collect()
}
