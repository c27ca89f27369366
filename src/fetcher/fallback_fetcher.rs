use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value, json};
use std::path::Path;
use tracing::{debug, info, warn};

use super::ProductSource;
use crate::config::FallbackConfig;

/// Recovers search hits from a saved copy of the site's search page.
///
/// Strategies, first non-empty result wins:
/// 1. embedded product objects (`skid` + `categories`), parsed as JSON or
///    rebuilt field by field when the JSON is truncated
/// 2. parallel `skid` / `text` / `categories` field lists zipped by index
/// 3. product cards matched with CSS selectors
pub struct FallbackParser {
    selectors: FallbackConfig,
    product_object: Regex,
    skid: Regex,
    text: Regex,
    categories: Regex,
    brand: Regex,
    price: Regex,
    list_price: Regex,
    score: Regex,
    image: Regex,
    slug: Regex,
    badge: Regex,
    rank_name: Regex,
    option_map: Regex,
}

impl FallbackParser {
    pub fn new(selectors: FallbackConfig) -> Result<Self> {
        Ok(FallbackParser {
            selectors,
            product_object: Regex::new(
                r#"\{[^{]*"skid":"[^"]*"[^}]*"categories":\[[^\]]*\][^}]*\}"#,
            )?,
            skid: Regex::new(r#""skid":"([^"]+)""#)?,
            text: Regex::new(r#""text":"([^"]+)""#)?,
            categories: Regex::new(r#""categories":(\[[^\]]*\])"#)?,
            brand: Regex::new(r#""brand":"([^"]*)""#)?,
            price: Regex::new(r#""price":([0-9]+)"#)?,
            list_price: Regex::new(r#""listPrice":([0-9]+)"#)?,
            score: Regex::new(r#""score":([0-9]+)"#)?,
            image: Regex::new(r#""image":"([^"]*)""#)?,
            slug: Regex::new(r#""slug":"([^"]*)""#)?,
            badge: Regex::new(r#""badge":"([^"]*)""#)?,
            rank_name: Regex::new(r#""rankName":"([^"]*)""#)?,
            option_map: Regex::new(r#""OptionMap":(\{[^}]*\})"#)?,
        })
    }

    pub fn parse(&self, document: &str) -> Vec<Value> {
        // Try embedded product objects first
        let hits = self.extract_product_objects(document);
        if !hits.is_empty() {
            info!("Recovered {} embedded product objects", hits.len());
            return hits;
        }

        // Fall back to zipping field lists
        let hits = self.extract_parallel_fields(document);
        if !hits.is_empty() {
            info!("Recovered {} products from parallel field lists", hits.len());
            return hits;
        }

        // Last resort: rendered product cards
        let hits = self.extract_product_cards(document);
        if !hits.is_empty() {
            info!("Recovered {} products from HTML product cards", hits.len());
            return hits;
        }

        warn!("No products found in fallback document");
        Vec::new()
    }

    fn extract_product_objects(&self, document: &str) -> Vec<Value> {
        let mut hits = Vec::new();

        for fragment in self.product_object.find_iter(document) {
            let fragment = fragment.as_str();
            match serde_json::from_str::<Value>(fragment) {
                Ok(object) if object.get("skid").is_some() && object.get("categories").is_some() => {
                    hits.push(object);
                }
                Ok(_) => debug!("Skipping embedded object without skid/categories"),
                // Truncated or escaped object
                Err(e) => {
                    debug!("Embedded object is not valid JSON ({}), recovering fields", e);
                    if let Some(object) = self.recover_fields(fragment) {
                        hits.push(object);
                    }
                }
            }
        }

        hits
    }

    /// Rebuild a hit from a fragment that failed to parse; needs `skid` and `text`
    fn recover_fields(&self, fragment: &str) -> Option<Value> {
        let skid = capture(&self.skid, fragment)?;
        let text = capture(&self.text, fragment)?;

        let mut object = Map::new();
        object.insert("skid".to_string(), json!(skid));
        object.insert("text".to_string(), json!(text));
        object.insert(
            "brand".to_string(),
            json!(capture(&self.brand, fragment).unwrap_or_default()),
        );

        if let Some(categories) = capture(&self.categories, fragment)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        {
            object.insert("categories".to_string(), categories);
        }

        for (key, pattern) in [
            ("price", &self.price),
            ("listPrice", &self.list_price),
            ("score", &self.score),
        ] {
            if let Some(number) = capture(pattern, fragment).and_then(|raw| raw.parse::<u64>().ok()) {
                object.insert(key.to_string(), json!(number));
            }
        }

        for (key, pattern) in [
            ("image", &self.image),
            ("slug", &self.slug),
            ("badge", &self.badge),
            ("rankName", &self.rank_name),
        ] {
            if let Some(value) = capture(pattern, fragment) {
                object.insert(key.to_string(), json!(value));
            }
        }

        if let Some(option_map) = capture(&self.option_map, fragment)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        {
            object.insert("OptionMap".to_string(), option_map);
        }

        Some(Value::Object(object))
    }

    fn extract_parallel_fields(&self, document: &str) -> Vec<Value> {
        let skids = captures_all(&self.skid, document);
        let texts = captures_all(&self.text, document);
        let categories = captures_all(&self.categories, document);
        let brands = captures_all(&self.brand, document);

        if !categories.is_empty() {
            let hits: Vec<Value> = skids
                .iter()
                .zip(texts.iter())
                .zip(categories.iter())
                .enumerate()
                .filter_map(|(index, ((skid, text), raw_categories))| {
                    let categories = serde_json::from_str::<Value>(raw_categories).ok()?;
                    Some(json!({
                        "skid": skid,
                        "text": text,
                        "categories": categories,
                        "brand": brands.get(index).cloned().unwrap_or_default(),
                    }))
                })
                .collect();

            if !hits.is_empty() {
                return hits;
            }
        }

        skids
            .iter()
            .zip(texts.iter())
            .map(|(skid, text)| json!({"skid": skid, "text": text}))
            .collect()
    }

    fn extract_product_cards(&self, document: &str) -> Vec<Value> {
        let html = Html::parse_document(document);

        for selector_str in &self.selectors.card_selectors {
            let Ok(selector) = Selector::parse(selector_str) else {
                warn!("Ignoring invalid card selector '{}'", selector_str);
                continue;
            };

            let cards: Vec<ElementRef> = html.select(&selector).collect();
            if cards.is_empty() {
                continue;
            }

            debug!("Card selector '{}' matched {} elements", selector_str, cards.len());
            let hits: Vec<Value> = cards
                .into_iter()
                .enumerate()
                .filter_map(|(index, card)| self.card_to_hit(card, index))
                .collect();

            if !hits.is_empty() {
                return hits;
            }
        }

        Vec::new()
    }

    fn card_to_hit(&self, card: ElementRef, index: usize) -> Option<Value> {
        let name = first_text(card, &self.selectors.name_selectors)?;

        let skid = card
            .value()
            .attr("data-skid")
            .or_else(|| card.value().attr("data-product-id"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("card-{}", index + 1));

        let mut object = Map::new();
        object.insert("skid".to_string(), json!(skid));
        object.insert("text".to_string(), json!(name));
        object.insert(
            "brand".to_string(),
            json!(first_text(card, &self.selectors.brand_selectors).unwrap_or_default()),
        );
        object.insert(
            "categories".to_string(),
            json!(all_texts(card, &self.selectors.category_selectors)),
        );

        if let Some(cents) = first_text(card, &self.selectors.price_selectors)
            .as_deref()
            .and_then(price_text_to_cents)
        {
            object.insert("price".to_string(), json!(cents));
        }

        Some(Value::Object(object))
    }
}

/// Reads the fallback document from disk and parses it
pub struct FallbackSource {
    path: String,
    parser: FallbackParser,
}

impl FallbackSource {
    pub fn new(config: &FallbackConfig) -> Result<Self> {
        Ok(FallbackSource {
            path: config.document_path.clone(),
            parser: FallbackParser::new(config.clone())?,
        })
    }
}

#[async_trait]
impl ProductSource for FallbackSource {
    fn name(&self) -> &str {
        &self.path
    }

    async fn fetch_hits(&self) -> Result<Vec<Value>> {
        if !Path::new(&self.path).exists() {
            return Err(anyhow!("Fallback document not found: {}", self.path));
        }

        let document = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read fallback document: {}", self.path))?;

        info!("Parsing {} characters from {}", document.len(), self.path);
        Ok(self.parser.parse(&document))
    }
}

fn capture(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn captures_all(pattern: &Regex, haystack: &str) -> Vec<String> {
    pattern
        .captures_iter(haystack)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(card: ElementRef, selectors: &[String]) -> Option<String> {
    selectors.iter().find_map(|selector_str| {
        let selector = Selector::parse(selector_str).ok()?;
        card.select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

fn all_texts(card: ElementRef, selectors: &[String]) -> Vec<String> {
    selectors
        .iter()
        .filter_map(|selector_str| Selector::parse(selector_str).ok())
        .flat_map(|selector| {
            card.select(&selector)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// "$19.99" -> 1999, matching the API's integer cents
fn price_text_to_cents(price_text: &str) -> Option<u64> {
    let numeric: String = price_text
        .replace(',', "")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let value = numeric.parse::<f64>().ok()?;
    if value <= 0.0 {
        return None;
    }
    Some((value * 100.0).round() as u64)
}
