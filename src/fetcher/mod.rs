pub mod api_fetcher;
pub mod fallback_fetcher;

pub use api_fetcher::*;
pub use fallback_fetcher::*;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

/// Anything that can produce raw search hits for the pipeline
#[async_trait]
pub trait ProductSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_hits(&self) -> Result<Vec<Value>>;
}

#[derive(Debug)]
pub struct AcquiredProducts {
    pub hits: Vec<Value>,
    pub source: String,
}

/// Try each source in order; the first one that yields hits wins
pub async fn acquire_products(sources: &[&dyn ProductSource]) -> Result<AcquiredProducts> {
    let mut failures = Vec::new();

    for source in sources {
        info!("Acquiring products from {}", source.name());

        match source.fetch_hits().await {
            Ok(hits) if !hits.is_empty() => {
                info!("Found {} products from {}", hits.len(), source.name());
                return Ok(AcquiredProducts {
                    hits,
                    source: source.name().to_string(),
                });
            }
            Ok(_) => {
                warn!("{} returned no products", source.name());
                failures.push(format!("{}: no products", source.name()));
            }
            Err(e) => {
                warn!("Error fetching products from {}: {:#}", source.name(), e);
                failures.push(format!("{}: {:#}", source.name(), e));
            }
        }
    }

    if failures.is_empty() {
        return Err(anyhow!("No product sources configured"));
    }

    Err(anyhow!(
        "All product sources failed ({})",
        failures.join("; ")
    ))
}
