use anyhow::{Result, anyhow};
use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ApiSection;
use crate::models::Product;

/// Concern keywords looked up in category names, in report order
const CONCERN_KEYWORDS: &[&str] = &[
    "acne",
    "dark spots",
    "hyperpigmentation",
    "wrinkle",
    "dryness",
    "sensitivity",
    "blemish",
    "pore",
    "anti-aging",
    "hydrating",
];

/// Turns raw search hits into [`Product`] records
pub struct ProductExtractor {
    api: ApiSection,
    size_pattern: Regex,
}

impl ProductExtractor {
    pub fn new(api: ApiSection) -> Result<Self> {
        Ok(ProductExtractor {
            api,
            size_pattern: Regex::new(r"(?i)\b\d+\.?\d*\s*(?:ml|g|oz|fl\s?oz|count|pack)\b")?,
        })
    }

    /// Extract every hit, skipping the ones without a product name
    pub fn extract_all(&self, hits: &[Value]) -> Vec<Product> {
        let mut products = Vec::with_capacity(hits.len());
        let mut failed_count = 0;

        for (index, hit) in hits.iter().enumerate() {
            match self.extract(hit) {
                Ok(product) => products.push(product),
                Err(e) => {
                    failed_count += 1;
                    warn!("Failed to extract product at index {}: {}", index, e);
                    if let Some(skid) = hit.get("skid").and_then(|v| v.as_str()) {
                        warn!("Failed product skid: {}", skid);
                    }
                }
            }
        }

        info!(
            "Product extraction summary: {} successful, {} failed out of {} total",
            products.len(),
            failed_count,
            hits.len()
        );

        products
    }

    pub fn extract(&self, hit: &Value) -> Result<Product> {
        let get_string = |key: &str| -> String {
            hit.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let name = Some(get_string("text"))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| get_string("name"));
        if name.is_empty() {
            return Err(anyhow!("Product name is empty"));
        }

        // Site SKU, or a numeric id on older payloads
        let product_id = Some(get_string("skid"))
            .filter(|id| !id.is_empty())
            .or_else(|| hit.get("id").map(value_to_plain_string))
            .unwrap_or_default();

        let image = Some(get_string("image"))
            .filter(|img| !img.is_empty())
            .or_else(|| {
                hit.get("images")
                    .and_then(|v| v.as_array())
                    .and_then(|arr| arr.first())
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        let source_url = self
            .api
            .product_url(&get_string("slug"), &product_id)
            .unwrap_or_default();

        // Derived fields
        let categories = self.extract_categories(hit);
        let size = self.extract_size(hit, &name);
        let concerns = extract_concerns(&categories);

        Ok(Product {
            product_id,
            name,
            brand: get_string("brand"),
            price: cents_to_dollars(hit.get("price")),
            list_price: cents_to_dollars(hit.get("listPrice")),
            site_score: hit.get("score").and_then(value_to_i64),
            categories,
            description: get_string("description"),
            size,
            concerns,
            image,
            source_url,
            badge: get_string("badge"),
            rank_name: get_string("rankName"),
        })
    }

    fn extract_categories(&self, hit: &Value) -> Vec<String> {
        let categories = hit.get("categories").map(categories_from_value).unwrap_or_default();
        if !categories.is_empty() {
            return categories;
        }

        // Some payloads carry categories under a differently named string field
        hit.as_object()
            .and_then(|object| {
                object
                    .iter()
                    .filter(|(key, _)| key.to_lowercase().contains("categories"))
                    .find_map(|(_, value)| {
                        value
                            .as_str()
                            .map(categories_from_str)
                            .filter(|found| !found.is_empty())
                    })
            })
            .unwrap_or_default()
    }

    fn extract_size(&self, hit: &Value, name: &str) -> String {
        let option_map = hit
            .get("OptionMap")
            .or_else(|| hit.get("options"))
            .and_then(|v| v.as_object());

        if let Some(options) = option_map {
            for (key, value) in options {
                let value_text = value_to_plain_string(value);
                if key.to_lowercase().contains("size") || value_text.to_lowercase().contains("size") {
                    return value_text;
                }
            }
        }

        // Size printed in the title
        self.size_pattern
            .find(name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

fn categories_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => categories_from_str(s),
        _ => Vec::new(),
    }
}

/// A string is either a JSON array of categories or one category
fn categories_from_str(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed @ Value::Array(_)) => categories_from_value(&parsed),
        _ => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    }
}

fn extract_concerns(categories: &[String]) -> Vec<String> {
    let mut concerns = Vec::new();
    for category in categories {
        let category_lower = category.to_lowercase();
        for concern in CONCERN_KEYWORDS {
            if category_lower.contains(concern) && !concerns.iter().any(|c| c == concern) {
                concerns.push(concern.to_string());
            }
        }
    }
    concerns
}

/// The search API reports prices as integer cents
fn cents_to_dollars(value: Option<&Value>) -> Option<f64> {
    let cents = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    // "NaN" and "inf" parse as floats
    if !cents.is_finite() {
        return None;
    }
    Some(cents.round() / 100.0)
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extractor() -> ProductExtractor {
        ProductExtractor::new(ApiSection::default()).unwrap()
    }

    #[test]
    fn test_full_search_hit() {
        let hit = json!({
            "skid": "SK100",
            "text": "CeraVe Hydrating Facial Cleanser 16 fl oz",
            "brand": "CeraVe",
            "description": "Gentle cleanser with ceramides and hyaluronic acid",
            "price": 1799,
            "listPrice": 1999,
            "score": 87,
            "image": "https://cdn.example.com/sk100.jpg",
            "slug": "cerave-hydrating-cleanser",
            "badge": "Best Seller",
            "rankName": "Facial Cleansers",
            "categories": ["Beauty & Personal Care", "Skin Care", "Face", "Cleansers", "Hydrating Cleansers"],
            "OptionMap": {}
        });

        let product = extractor().extract(&hit).unwrap();
        assert_eq!(product.product_id, "SK100");
        assert_eq!(product.name, "CeraVe Hydrating Facial Cleanser 16 fl oz");
        assert_eq!(product.brand, "CeraVe");
        assert_eq!(product.price, Some(17.99));
        assert_eq!(product.list_price, Some(19.99));
        assert_eq!(product.site_score, Some(87));
        assert_eq!(product.categories.len(), 5);
        assert_eq!(product.size, "16 fl oz");
        assert_eq!(product.concerns, vec!["hydrating".to_string()]);
        assert_eq!(
            product.source_url,
            "https://snapklik.com/en-gb/product/cerave-hydrating-cleanser/SK100"
        );
        assert_eq!(product.badge, "Best Seller");
        assert_eq!(product.rank_name, "Facial Cleansers");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        assert!(extractor().extract(&json!({"skid": "X1", "price": 100})).is_err());
        assert!(extractor().extract(&json!({"skid": "X1", "text": "   "})).is_err());
    }

    #[test]
    fn test_name_and_id_fallbacks() {
        let product = extractor()
            .extract(&json!({"name": "Aloe Gel", "id": 42, "images": ["a.jpg", "b.jpg"]}))
            .unwrap();
        assert_eq!(product.name, "Aloe Gel");
        assert_eq!(product.product_id, "42");
        assert_eq!(product.image, "a.jpg");
        assert!(product.source_url.is_empty());
        assert!(product.price.is_none());
        assert!(product.categories.is_empty());
    }

    #[test]
    fn test_categories_from_json_string() {
        let product = extractor()
            .extract(&json!({
                "text": "Spot Patch",
                "categories": "[\"Skin Care\", \"Acne & Blemish Treatments\"]"
            }))
            .unwrap();
        assert_eq!(product.categories, vec!["Skin Care", "Acne & Blemish Treatments"]);
        assert_eq!(product.concerns, vec!["acne", "blemish"]);

        let single = extractor()
            .extract(&json!({"text": "Toner", "categories": "Toners"}))
            .unwrap();
        assert_eq!(single.categories, vec!["Toners"]);
    }

    #[test]
    fn test_categories_from_alternate_key() {
        let product = extractor()
            .extract(&json!({
                "text": "Night Cream",
                "categories": [],
                "subCategories": "[\"Anti-Aging Creams\"]"
            }))
            .unwrap();
        assert_eq!(product.categories, vec!["Anti-Aging Creams"]);
        assert_eq!(product.concerns, vec!["anti-aging"]);
    }

    #[test]
    fn test_size_from_option_map_before_title() {
        let product = extractor()
            .extract(&json!({
                "text": "Rosehip Oil 30 ml",
                "OptionMap": {"Color": "Amber", "Size": "1 fl oz"}
            }))
            .unwrap();
        assert_eq!(product.size, "1 fl oz");

        let from_title = extractor()
            .extract(&json!({"text": "Sheet Masks 10 Pack", "OptionMap": {"Color": "White"}}))
            .unwrap();
        assert_eq!(from_title.size, "10 Pack");

        let none = extractor().extract(&json!({"text": "Face Serum"})).unwrap();
        assert!(none.size.is_empty());
    }

    #[test]
    fn test_prices_as_strings() {
        let product = extractor()
            .extract(&json!({"text": "Clay Mask", "price": "2349", "listPrice": "", "score": "12"}))
            .unwrap();
        assert_eq!(product.price, Some(23.49));
        assert!(product.list_price.is_none());
        assert_eq!(product.site_score, Some(12));
    }

    #[test]
    fn test_extract_all_skips_invalid_hits() {
        let hits = vec![
            json!({"skid": "A", "text": "First"}),
            json!({"skid": "B"}),
            json!({"skid": "C", "text": "Third"}),
        ];

        let products = extractor().extract_all(&hits);
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third"]);
    }

    #[test]
    fn test_concerns_are_not_repeated() {
        let product = extractor()
            .extract(&json!({
                "text": "Clarifying Patches",
                "categories": ["Acne Treatments", "Acne Spot Patches", "Pore Strips"]
            }))
            .unwrap();
        assert_eq!(product.concerns, vec!["acne", "pore"]);

        let single = extractor()
            .extract(&json!({"text": "Spot Gel", "categories": ["Acne Treatments"]}))
            .unwrap();
        assert_eq!(single.concerns, vec!["acne"]);
    }

    #[test]
    fn test_non_finite_prices_are_missing() {
        for raw in ["NaN", "inf", "-inf"] {
            let product = extractor()
                .extract(&json!({"text": "Face Mist", "price": raw, "listPrice": raw}))
                .unwrap();
            assert!(product.price.is_none(), "price {} should be missing", raw);
            assert!(product.list_price.is_none());
        }
    }
}
