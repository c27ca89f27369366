use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration for one scraping run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub api: ApiSection,
    pub pagination: PaginationConfig,
    pub fallback: FallbackConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
    /// Optional TOML alias table replacing the built-in lexicon
    pub lexicon_path: Option<String>,
}

/// Search API endpoint and request headers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub name: String,
    pub base_url: String,
    pub search_term: String,
    pub product_url_base: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub start_page: u32,
    pub max_pages: u32,
    pub delay_between_pages_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

/// Local document parsed when the search API is unavailable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub document_path: String,
    pub card_selectors: Vec<String>,
    pub name_selectors: Vec<String>,
    pub brand_selectors: Vec<String>,
    pub price_selectors: Vec<String>,
    pub category_selectors: Vec<String>,
}

/// Weights of the product score used for ranking inside an ingredient group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub price_weight: f64,
    pub price_cap: f64,
    pub concern_weight: f64,
    pub concern_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub raw_csv_path: String,
    pub grouped_csv_path: String,
    pub top_per_ingredient: Option<usize>,
}

impl ScraperConfig {
    /// Parse a TOML configuration file
    #[cfg(test)]
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scraper config file: {}", path))?;

        let config: ScraperConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse scraper config file: {}", path))?;

        Ok(config)
    }

    /// Load a TOML file layered with `SKINCARE__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::with_name(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix("SKINCARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path))?;

        let config: ScraperConfig = settings
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {}", path))?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(anyhow!("API base URL cannot be empty"));
        }

        if self.pagination.max_pages == 0 {
            return Err(anyhow!("max_pages must be at least 1"));
        }

        if self.scoring.price_cap <= 0.0 {
            return Err(anyhow!(
                "price_cap must be positive, got {}",
                self.scoring.price_cap
            ));
        }

        if self.output.raw_csv_path.is_empty() || self.output.grouped_csv_path.is_empty() {
            return Err(anyhow!("Output CSV paths cannot be empty"));
        }

        if self.output.top_per_ingredient == Some(0) {
            return Err(anyhow!("top_per_ingredient must be at least 1 when set"));
        }

        Ok(())
    }
}

impl ApiSection {
    /// Search URL for one result page
    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}?p={}&s={}",
            self.base_url,
            page,
            urlencoding::encode(&self.search_term)
        )
    }

    pub fn product_url(&self, slug: &str, skid: &str) -> Option<String> {
        if slug.is_empty() || skid.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{}/{}",
            self.product_url_base.trim_end_matches('/'),
            slug,
            skid
        ))
    }
}

impl Default for ApiSection {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "User-Agent".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        );
        headers.insert(
            "Accept".to_string(),
            "application/json, text/plain, */*".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());
        headers.insert("Origin".to_string(), "https://snapklik.com".to_string());
        headers.insert("Referer".to_string(), "https://snapklik.com/".to_string());

        Self {
            name: "snapklik".to_string(),
            base_url: "https://sk-backend-xxhrslt5oq-uc.a.run.app/a/sr/".to_string(),
            search_term: "skin care".to_string(),
            product_url_base: "https://snapklik.com/en-gb/product".to_string(),
            headers,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            start_page: 0,
            max_pages: 50,
            delay_between_pages_ms: 1000,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            document_path: "debug.html".to_string(),
            card_selectors: vec![
                "[data-skid]".to_string(),
                ".product-card".to_string(),
                ".product-item".to_string(),
            ],
            name_selectors: vec![
                ".product-title".to_string(),
                ".product-name".to_string(),
                "h3".to_string(),
                "h2".to_string(),
            ],
            brand_selectors: vec![".product-brand".to_string(), ".brand".to_string()],
            price_selectors: vec![
                ".price".to_string(),
                "[data-price]".to_string(),
                "[class*='price']".to_string(),
            ],
            category_selectors: vec![".category".to_string(), ".breadcrumb li".to_string()],
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            price_weight: 50.0,
            price_cap: 100.0,
            concern_weight: 10.0,
            concern_cap: 5,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw_csv_path: "output/snapklik_products.csv".to_string(),
            grouped_csv_path: "output/grouped_skincare_products.csv".to_string(),
            top_per_ingredient: None,
        }
    }
}
