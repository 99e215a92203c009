use crate::traits::PageFetcher;
use crate::types::{AggregatorError, FetchConfig, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Body of a successful GET together with where it actually came from.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects, used to resolve relative links
    pub url: Url,
    pub body: String,
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// GET `url`, retrying transport errors, 429 and 5xx responses with
    /// exponential backoff. Other non-success statuses fail immediately.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let start_time = Instant::now();
        debug!("Fetching page: {}", url);

        let target = Url::parse(url)?;
        self.wait_for_host_slot(&target).await;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            let error = match self.client.get(target.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        if let Some(content_length) = response.content_length() {
                            let size_mb = content_length as usize / (1024 * 1024);
                            if size_mb > self.config.max_body_size_mb {
                                return Err(AggregatorError::BodyTooLarge { size_mb });
                            }
                        }

                        let final_url = response.url().clone();
                        let body = response.text().await?;
                        let response_time_ms = start_time.elapsed().as_millis() as u64;
                        info!("Fetched {} ({} bytes, {}ms)", final_url, body.len(), response_time_ms);

                        return Ok(FetchedPage { url: final_url, body });
                    }

                    let error = AggregatorError::General(format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown")
                    ));
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) => AggregatorError::Http(e),
            };

            last_error = Some(error);

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        Err(last_error.unwrap_or_else(|| AggregatorError::General(format!("Failed to fetch {}", url))))
    }

    /// Space consecutive requests to one host by `min_host_interval_ms`.
    async fn wait_for_host_slot(&self, url: &Url) {
        let wait = self.reserve_host_slot(url).await;
        if !wait.is_zero() {
            debug!("Spacing requests to {}: waiting {:?}", url.host_str().unwrap_or_default(), wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Claim the next free request slot for the host and return how long
    /// until it opens. The map is only locked while claiming, so waiting on
    /// one host never delays another.
    async fn reserve_host_slot(&self, url: &Url) -> Duration {
        let host = url.host_str().unwrap_or_default();
        let spacing = Duration::from_millis(self.config.min_host_interval_ms);
        let now = Instant::now();

        let mut next_slots = self.rate_limiter.write().await;
        let slot = match next_slots.get(host) {
            Some(previous) => (*previous + spacing).max(now),
            None => now,
        };
        next_slots.insert(host.to_string(), slot);
        slot - now
    }
}

#[async_trait]
impl PageFetcher for Fetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        Fetcher::fetch_page(self, url).await
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
