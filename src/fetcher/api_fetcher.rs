use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use wreq::{Client, Response};
use wreq_util::Emulation;

use super::ProductSource;
use crate::config::{ApiSection, PaginationConfig};
use crate::models::{SearchPage, SearchResponse};

/// Paginated client for the site's product search API
pub struct ApiFetcher {
    client: Client,
    api: ApiSection,
    pagination: PaginationConfig,
}

impl ApiFetcher {
    pub fn new(api: ApiSection, pagination: PaginationConfig) -> Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;

        Ok(ApiFetcher {
            client,
            api,
            pagination,
        })
    }

    pub async fn fetch_all(&self) -> Result<Vec<Value>> {
        paginate(self, &self.pagination, &self.api.name).await
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let mut request = self.client.get(url);

        // Browser-like headers from config
        for (key, value) in &self.api.headers {
            request = request.header(key, value);
        }

        let response: Response = request.send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", url, e))?;

        Ok(body)
    }
}

/// Anything that serves numbered search result pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// `None` when the response carries no data
    async fn fetch_page(&self, page: u32) -> Result<Option<SearchPage>>;
}

#[async_trait]
impl PageSource for ApiFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Option<SearchPage>> {
        let url = self.api.page_url(page);
        let body = with_retries(
            self.pagination.max_retries,
            self.pagination.retry_base_delay_ms,
            &url,
            || self.fetch_json(&url),
        )
        .await?;
        parse_search_response(body)
    }
}

/// Fetch every page until the source reports it is finished.
///
/// A failure on the first page is returned as an error so the caller can
/// switch to the fallback document. Later failures stop pagination and
/// keep what was already collected.
pub async fn paginate(
    pages: &dyn PageSource,
    pagination: &PaginationConfig,
    source_name: &str,
) -> Result<Vec<Value>> {
    let mut all_hits = Vec::new();
    let first_page = pagination.start_page;
    let last_page = first_page.saturating_add(pagination.max_pages);
    let mut page = first_page;
    let mut pages_fetched = 0;

    loop {
        if page >= last_page {
            warn!(
                "Reached maximum page limit ({}) for {}, stopping",
                pagination.max_pages, source_name
            );
            break;
        }

        // Rate limiting
        if page > first_page {
            sleep(Duration::from_millis(pagination.delay_between_pages_ms)).await;
        }

        info!("Fetching page {}...", page);

        let search_page = match pages.fetch_page(page).await {
            Ok(Some(search_page)) => search_page,
            Ok(None) if page == first_page => {
                return Err(anyhow!("Search API returned no data for page {}", page));
            }
            Ok(None) => {
                info!("No data on page {}, stopping pagination", page);
                break;
            }
            // Nothing collected yet, let the caller fall back
            Err(e) if page == first_page => return Err(e),
            Err(e) => {
                warn!("Failed to fetch page {}: {:#}, stopping pagination", page, e);
                break;
            }
        };

        pages_fetched += 1;
        let hit_count = search_page.hits.len();
        info!("Found {} products on page {}", hit_count, page);
        all_hits.extend(search_page.hits);

        // Check if we've reached the end
        if search_page.is_finished {
            info!("Search API reports page {} as the last page", page);
            break;
        }
        if hit_count == 0 {
            info!("Empty page {}, stopping pagination", page);
            break;
        }

        page += 1;
    }

    info!(
        "Completed pagination: {} total products across {} pages",
        all_hits.len(),
        pages_fetched
    );

    Ok(all_hits)
}

/// Run `op` once, then retry up to `max_retries` more times with backoff
pub async fn with_retries<T, F, Fut>(
    max_retries: u32,
    base_delay_ms: u64,
    label: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(anyhow!(
                        "Failed to fetch {} after {} attempts: {:#}",
                        label,
                        attempt,
                        e
                    ));
                }

                let jitter = rand::random::<u64>() % base_delay_ms.max(1);
                let delay = backoff_delay(base_delay_ms, attempt, jitter);
                warn!(
                    "Attempt {} failed for {}, retrying in {:?}: {:#}",
                    attempt, label, delay, e
                );
                sleep(delay).await;
            }
        }
    }
}

#[async_trait]
impl ProductSource for ApiFetcher {
    fn name(&self) -> &str {
        &self.api.name
    }

    async fn fetch_hits(&self) -> Result<Vec<Value>> {
        self.fetch_all().await
    }
}

pub fn parse_search_response(body: Value) -> Result<Option<SearchPage>> {
    let response: SearchResponse = serde_json::from_value(body)
        .map_err(|e| anyhow!("Unexpected search response shape: {}", e))?;
    Ok(response.data)
}

/// Exponential backoff: `base * 2^attempt + jitter`
pub fn backoff_delay(base_ms: u64, attempt: u32, jitter_ms: u64) -> Duration {
    let factor = 2_u64.saturating_pow(attempt);
    Duration::from_millis(base_ms.saturating_mul(factor).saturating_add(jitter_ms))
}
