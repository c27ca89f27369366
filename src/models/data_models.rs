use serde::Deserialize;
use serde_json::Value;

/// One scraped skincare listing, normalized from a search hit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub brand: String,
    /// USD
    pub price: Option<f64>,
    /// USD
    pub list_price: Option<f64>,
    /// The site's own listing score
    pub site_score: Option<i64>,
    pub categories: Vec<String>,
    pub description: String,
    pub size: String,
    pub concerns: Vec<String>,
    pub image: String,
    pub source_url: String,
    pub badge: String,
    pub rank_name: String,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Product {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_concerns<I, S>(mut self, concerns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concerns = concerns.into_iter().map(Into::into).collect();
        self
    }
}

/// Search API response: `{"data": {"hits": [...], "isFinished": bool}}`
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<SearchPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub hits: Vec<Value>,
    // A page without the flag is the last one
    #[serde(rename = "isFinished", default = "finished_by_default")]
    pub is_finished: bool,
}

fn finished_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_response_parsing() {
        let response: SearchResponse = serde_json::from_value(json!({
            "data": {
                "hits": [{"skid": "A1", "text": "Serum"}],
                "isFinished": false
            }
        }))
        .unwrap();

        let page = response.data.unwrap();
        assert_eq!(page.hits.len(), 1);
        assert!(!page.is_finished);
    }

    #[test]
    fn test_missing_flag_means_finished() {
        let response: SearchResponse =
            serde_json::from_value(json!({"data": {"hits": []}})).unwrap();
        assert!(response.data.unwrap().is_finished);

        let empty: SearchResponse = serde_json::from_value(json!({"error": "nope"})).unwrap();
        assert!(empty.data.is_none());
    }
}
