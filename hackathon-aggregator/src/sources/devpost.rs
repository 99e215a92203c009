use crate::listing_utils::{text::collapse_whitespace, url::resolve};
use crate::traits::{PageFetcher, SourceAdapter};
use crate::types::{AggregatorError, DevPostListing, RawRecord, Result, Source};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

const TILE_SELECTORS: &[&str] = &[".hackathon-tile", ".challenge-listing", "article.hackathon"];
const TITLE_SELECTORS: &[&str] = &["h3", "h2", ".title"];
const PERIOD_SELECTORS: &[&str] = &[".submission-period", ".hackathon-dates", "time"];
const LOCATION_SELECTORS: &[&str] = &[".location", ".info-with-icon .info span", ".info span"];
const PRIZE_SELECTORS: &[&str] = &[".prize-amount", ".prizes"];
const HOST_SELECTORS: &[&str] = &[".host-label", ".host"];
const DESCRIPTION_SELECTORS: &[&str] = &[".challenge-description", ".tagline", "p.description"];
const LINK_SELECTORS: &[&str] = &["a.tile-anchor", "a[href]"];

const DEFAULT_PAGE_BUDGET: Duration = Duration::from_secs(20);

/// Scrapes the public DevPost hackathon listing, one page at a time.
pub struct DevPostSource {
    fetcher: Arc<dyn PageFetcher>,
    listing_url: String,
    max_pages: usize,
    page_budget: Duration,
}

impl DevPostSource {
    pub fn new(fetcher: Arc<dyn PageFetcher>, listing_url: impl Into<String>, max_pages: usize) -> Self {
        Self {
            fetcher,
            listing_url: listing_url.into(),
            max_pages: max_pages.max(1),
            page_budget: DEFAULT_PAGE_BUDGET,
        }
    }

    /// Total time pagination may take. Once it runs out the pages scraped so
    /// far are returned; it must stay below the pipeline's source timeout.
    pub fn with_page_budget(mut self, budget: Duration) -> Self {
        self.page_budget = budget;
        self
    }

    fn page_url(&self, page: usize) -> Result<String> {
        let mut url = Url::parse(&self.listing_url)?;
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl SourceAdapter for DevPostSource {
    fn source(&self) -> Source {
        Source::DevPost
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        let deadline = Instant::now() + self.page_budget;

        for page in 1..=self.max_pages {
            let url = self.page_url(page)?;
            let remaining = deadline.saturating_duration_since(Instant::now());

            let fetched = match tokio::time::timeout(remaining, self.fetcher.fetch_page(&url)).await {
                Ok(Ok(fetched)) => fetched,
                Ok(Err(e)) if page == 1 => {
                    return Err(AggregatorError::SourceUnavailable {
                        adapter: Source::DevPost,
                        reason: e.to_string(),
                    });
                }
                Err(_) if page == 1 => {
                    return Err(AggregatorError::Timeout {
                        adapter: Source::DevPost,
                        seconds: self.page_budget.as_secs(),
                    });
                }
                Ok(Err(e)) => {
                    // Earlier pages were fine; keep what we have
                    warn!("DevPost page {} failed, stopping pagination: {}", page, e);
                    break;
                }
                Err(_) => {
                    warn!(
                        "DevPost page {} ran past the {:?} pagination budget, keeping {} listings",
                        page,
                        self.page_budget,
                        records.len()
                    );
                    break;
                }
            };

            let listings = parse_listing_html(&fetched.body, &fetched.url);
            debug!("DevPost page {} yielded {} listings", page, listings.len());
            if listings.is_empty() {
                break;
            }
            records.extend(listings.into_iter().map(RawRecord::DevPost));
        }

        info!("Scraped {} DevPost listings", records.len());
        Ok(records)
    }
}

/// Extract the hackathon tiles of one listing page. Tiles without a title
/// are skipped.
pub fn parse_listing_html(html: &str, page_url: &Url) -> Vec<DevPostListing> {
    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for selector_str in TILE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        for tile in document.select(&selector) {
            match parse_tile(&tile, page_url) {
                Some(listing) => listings.push(listing),
                None => debug!("Skipping DevPost tile without a title"),
            }
        }

        if !listings.is_empty() {
            break;
        }
    }

    listings
}

fn parse_tile(tile: &ElementRef, page_url: &Url) -> Option<DevPostListing> {
    let title = select_text(tile, TITLE_SELECTORS)?;

    let url = LINK_SELECTORS.iter().find_map(|sel_str| {
        let sel = Selector::parse(sel_str).ok()?;
        let href = tile.select(&sel).find_map(|a| a.value().attr("href"))?;
        resolve(page_url, href)
    });

    Some(DevPostListing {
        title,
        submission_period: select_text(tile, PERIOD_SELECTORS).unwrap_or_default(),
        location: select_text(tile, LOCATION_SELECTORS).unwrap_or_default(),
        prize: select_compact_text(tile, PRIZE_SELECTORS).unwrap_or_default(),
        themes: select_all_text(tile, ".theme-label"),
        url,
        host: select_text(tile, HOST_SELECTORS).unwrap_or_default(),
        description: select_text(tile, DESCRIPTION_SELECTORS).unwrap_or_default(),
    })
}

/// First non-empty text among `selectors`, words joined by single spaces
fn select_text(element: &ElementRef, selectors: &[&str]) -> Option<String> {
    for sel_str in selectors {
        if let Ok(sel) = Selector::parse(sel_str) {
            if let Some(found) = element.select(&sel).next() {
                let text = collapse_whitespace(&found.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Like [`select_text`] but joins text nodes without spaces, so markup such
/// as `$<span>10,000</span>` reads `$10,000`
fn select_compact_text(element: &ElementRef, selectors: &[&str]) -> Option<String> {
    for sel_str in selectors {
        if let Ok(sel) = Selector::parse(sel_str) {
            if let Some(found) = element.select(&sel).next() {
                let text = collapse_whitespace(&found.text().collect::<String>());
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn select_all_text(element: &ElementRef, selector: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    element
        .select(&sel)
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect()
}
