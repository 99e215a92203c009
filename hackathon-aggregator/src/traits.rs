use crate::fetcher::FetchedPage;
use crate::types::{RawRecord, Result, Source};
use async_trait::async_trait;

/// Trait for pulling hackathon listings from one origin (scraped page, JSON
/// feed, curated list).
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Provenance attached to every record this adapter yields
    fn source(&self) -> Source;

    /// Human-readable name for logs
    fn source_name(&self) -> String {
        self.source().to_string()
    }

    /// Fetch every listing the source currently publishes.
    ///
    /// Items that cannot be extracted are skipped rather than failing the
    /// call. An `Err` means the source as a whole could not be reached; the
    /// pipeline treats that as zero records from this adapter.
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// Retrieval of one page body, the seam between adapters and the network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage>;
}
