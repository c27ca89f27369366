use std::collections::HashMap;
use tracing::{debug, info};

use super::{IngredientInferencer, ProductScorer};
use crate::models::Product;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedProduct<'a> {
    /// 1-based, contiguous within the group
    pub rank: usize,
    pub product: &'a Product,
    pub score: f64,
}

/// Every product inferred to contain one canonical ingredient, best first
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientGroup<'a> {
    pub ingredient: String,
    pub products: Vec<RankedProduct<'a>>,
}

impl IngredientGroup<'_> {
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

pub struct IngredientGrouper {
    inferencer: IngredientInferencer,
    scorer: ProductScorer,
}

impl IngredientGrouper {
    pub fn new(inferencer: IngredientInferencer, scorer: ProductScorer) -> Self {
        IngredientGrouper { inferencer, scorer }
    }

    /// Group products by inferred ingredient and rank each group by score.
    ///
    /// Groups come out in order of first occurrence while scanning `products`
    /// in scrape order (alphabetical among ingredients first seen on the same
    /// product). Within a group the sort is stable, so equal scores keep
    /// scrape order.
    pub fn group_and_rank<'a>(&self, products: &'a [Product]) -> Vec<IngredientGroup<'a>> {
        let mut groups: Vec<IngredientGroup<'a>> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();

        // Fan out into per-ingredient buckets
        for product in products {
            let ingredients = self.inferencer.infer(product);
            if ingredients.is_empty() {
                debug!("No key ingredients inferred for '{}'", product.name);
                continue;
            }

            let score = self.scorer.score(product);
            for ingredient in ingredients {
                let index = match group_index.get(&ingredient) {
                    Some(&index) => index,
                    None => {
                        groups.push(IngredientGroup {
                            ingredient: ingredient.clone(),
                            products: Vec::new(),
                        });
                        group_index.insert(ingredient, groups.len() - 1);
                        groups.len() - 1
                    }
                };

                groups[index].products.push(RankedProduct {
                    rank: 0,
                    product,
                    score,
                });
            }
        }

        // Rank within each bucket
        for group in &mut groups {
            group.products.sort_by(|a, b| b.score.total_cmp(&a.score));
            for (position, entry) in group.products.iter_mut().enumerate() {
                entry.rank = position + 1;
            }
        }

        info!(
            "Grouped {} products into {} ingredient groups",
            products.len(),
            groups.len()
        );

        groups
    }
}

/// The largest groups by product count; ties keep group order
pub fn largest_groups<'g>(groups: &'g [IngredientGroup<'_>], limit: usize) -> Vec<(&'g str, usize)> {
    let mut sizes: Vec<(&str, usize)> = groups
        .iter()
        .map(|group| (group.ingredient.as_str(), group.len()))
        .collect();
    sizes.sort_by(|a, b| b.1.cmp(&a.1));
    sizes.truncate(limit);
    sizes
}
