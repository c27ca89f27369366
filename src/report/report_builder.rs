use anyhow::{Result, anyhow};
use polars::prelude::*;

use crate::models::Product;
use crate::processor::IngredientGroup;

pub const RAW_COLUMNS: [&str; 14] = [
    "product_id",
    "name",
    "brand",
    "price",
    "list_price",
    "site_score",
    "categories",
    "description",
    "size",
    "concerns",
    "image",
    "source_url",
    "badge",
    "rank_name",
];

pub const GROUPED_COLUMNS: [&str; 6] = [
    "Key Ingredient",
    "Product Rank",
    "Product Name",
    "Brand",
    "Price (USD)",
    "Product Score",
];

const LIST_SEPARATOR: &str = " | ";

/// Flattens products and ranked groups into report tables
pub struct ReportBuilder {
    top_per_ingredient: Option<usize>,
}

impl ReportBuilder {
    pub fn new(top_per_ingredient: Option<usize>) -> Self {
        ReportBuilder { top_per_ingredient }
    }

    /// One row per product, in scrape order
    pub fn raw_report(&self, products: &[Product]) -> Result<DataFrame> {
        let text = |f: fn(&Product) -> String| -> Vec<String> { products.iter().map(f).collect() };

        let columns: Vec<Column> = vec![
            Series::new(RAW_COLUMNS[0].into(), text(|p| p.product_id.clone())).into(),
            Series::new(RAW_COLUMNS[1].into(), text(|p| p.name.clone())).into(),
            Series::new(RAW_COLUMNS[2].into(), text(|p| p.brand.clone())).into(),
            Series::new(
                RAW_COLUMNS[3].into(),
                products.iter().map(|p| p.price).collect::<Vec<Option<f64>>>(),
            )
            .into(),
            Series::new(
                RAW_COLUMNS[4].into(),
                products.iter().map(|p| p.list_price).collect::<Vec<Option<f64>>>(),
            )
            .into(),
            Series::new(
                RAW_COLUMNS[5].into(),
                products.iter().map(|p| p.site_score).collect::<Vec<Option<i64>>>(),
            )
            .into(),
            Series::new(RAW_COLUMNS[6].into(), text(|p| p.categories.join(LIST_SEPARATOR))).into(),
            Series::new(RAW_COLUMNS[7].into(), text(|p| p.description.clone())).into(),
            Series::new(RAW_COLUMNS[8].into(), text(|p| p.size.clone())).into(),
            Series::new(RAW_COLUMNS[9].into(), text(|p| p.concerns.join(LIST_SEPARATOR))).into(),
            Series::new(RAW_COLUMNS[10].into(), text(|p| p.image.clone())).into(),
            Series::new(RAW_COLUMNS[11].into(), text(|p| p.source_url.clone())).into(),
            Series::new(RAW_COLUMNS[12].into(), text(|p| p.badge.clone())).into(),
            Series::new(RAW_COLUMNS[13].into(), text(|p| p.rank_name.clone())).into(),
        ];

        DataFrame::new(columns).map_err(|e| anyhow!("Failed to build raw report: {}", e))
    }

    /// One row per (ingredient, rank), ordered by group then rank
    pub fn grouped_report(&self, groups: &[IngredientGroup<'_>]) -> Result<DataFrame> {
        let mut ingredients = Vec::new();
        let mut ranks = Vec::new();
        let mut names = Vec::new();
        let mut brands = Vec::new();
        let mut prices = Vec::new();
        let mut scores = Vec::new();

        for group in groups {
            let limit = self.top_per_ingredient.unwrap_or(group.len());
            for entry in group.products.iter().take(limit) {
                ingredients.push(group.ingredient.clone());
                ranks.push(entry.rank as u32);
                names.push(entry.product.name.clone());
                brands.push(entry.product.brand.clone());
                prices.push(format_price(entry.product.price));
                scores.push(entry.score);
            }
        }

        let columns: Vec<Column> = vec![
            Series::new(GROUPED_COLUMNS[0].into(), ingredients).into(),
            Series::new(GROUPED_COLUMNS[1].into(), ranks).into(),
            Series::new(GROUPED_COLUMNS[2].into(), names).into(),
            Series::new(GROUPED_COLUMNS[3].into(), brands).into(),
            Series::new(GROUPED_COLUMNS[4].into(), prices).into(),
            Series::new(GROUPED_COLUMNS[5].into(), scores).into(),
        ];

        DataFrame::new(columns).map_err(|e| anyhow!("Failed to build grouped report: {}", e))
    }
}

/// `$12.34`, or empty when the price is unknown
pub fn format_price(price: Option<f64>) -> String {
    price.map(|p| format!("${:.2}", p)).unwrap_or_default()
}
