pub mod types;
pub mod traits;
pub mod fetcher;
pub mod listing_utils;
pub mod sources;
pub mod normalizer;
pub mod dedup;
pub mod status;
pub mod publisher;
pub mod summary;
pub mod pipeline;

pub use types::*;
pub use traits::SourceAdapter;
pub use fetcher::Fetcher;
pub use sources::{CuratedSource, DevPostSource, MlhSource};
pub use normalizer::{normalize, MalformedRecord};
pub use dedup::deduplicate;
pub use publisher::{PublishOutcome, Publisher};
pub use summary::RunSummary;
pub use pipeline::{Pipeline, PipelineBuilder, RunReport};
