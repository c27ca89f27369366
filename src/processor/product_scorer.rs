use crate::config::ScoringConfig;
use crate::models::Product;

/// Heuristic quality proxy used only to rank products inside an ingredient group.
///
/// `score = price_points + concern_points`, rounded to two decimals:
/// - `price_points = price_weight * (1 - min(price, price_cap) / price_cap)`,
///   or `price_weight / 2` when the price is missing or not positive
/// - `concern_points = concern_weight * min(concern_count, concern_cap)`
pub struct ProductScorer {
    weights: ScoringConfig,
}

impl ProductScorer {
    pub fn new(weights: ScoringConfig) -> Self {
        ProductScorer { weights }
    }

    pub fn score(&self, product: &Product) -> f64 {
        let raw = self.price_points(product.price) + self.concern_points(product.concerns.len());
        (raw * 100.0).round() / 100.0
    }

    fn price_points(&self, price: Option<f64>) -> f64 {
        let weight = self.weights.price_weight;
        match price {
            Some(price) if price > 0.0 && self.weights.price_cap > 0.0 => {
                let capped = price.min(self.weights.price_cap);
                weight * (1.0 - capped / self.weights.price_cap)
            }
            _ => weight / 2.0,
        }
    }

    fn concern_points(&self, concern_count: usize) -> f64 {
        self.weights.concern_weight * concern_count.min(self.weights.concern_cap) as f64
    }
}

impl Default for ProductScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cheaper_scores_higher() {
        let scorer = ProductScorer::default();
        let cheap = Product::new("Cheap").with_price(10.0);
        let pricey = Product::new("Pricey").with_price(60.0);

        assert_eq!(scorer.score(&cheap), 45.0);
        assert_eq!(scorer.score(&pricey), 20.0);
    }

    #[test]
    fn test_price_contribution_is_capped() {
        let scorer = ProductScorer::default();
        assert_eq!(scorer.score(&Product::new("Luxury").with_price(100.0)), 0.0);
        assert_eq!(scorer.score(&Product::new("Ultra").with_price(450.0)), 0.0);
    }

    #[test]
    fn test_missing_price_is_neutral() {
        let scorer = ProductScorer::default();
        assert_eq!(scorer.score(&Product::new("Unknown")), 25.0);
        assert_eq!(scorer.score(&Product::new("Free").with_price(0.0)), 25.0);
    }

    #[test]
    fn test_concerns_add_points_up_to_cap() {
        let scorer = ProductScorer::new(ScoringConfig {
            concern_cap: 2,
            ..ScoringConfig::default()
        });

        let one = Product::new("One").with_concerns(["acne"]);
        let many = Product::new("Many").with_concerns(["acne", "pore", "blemish", "dryness"]);

        assert_eq!(scorer.score(&one), 35.0);
        assert_eq!(scorer.score(&many), 45.0);
    }

    #[test]
    fn test_score_is_rounded_and_deterministic() {
        let scorer = ProductScorer::default();
        let product = Product::new("Toner").with_price(17.89);

        let first = scorer.score(&product);
        assert_eq!(first, scorer.score(&product));
        assert_eq!(first, (first * 100.0).round() / 100.0);
        assert!((first - 41.06).abs() < 0.011);
    }
}
