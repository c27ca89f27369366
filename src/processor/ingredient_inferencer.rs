use std::collections::BTreeSet;

use crate::config::IngredientLexicon;
use crate::models::Product;

/// Detects likely key ingredients from a product's category and description text.
///
/// Source listings never expose real ingredient lists, so an alias found
/// anywhere in the lowercased text counts as the canonical ingredient being
/// present. Matching is plain substring search; word boundaries, position and
/// frequency are ignored.
pub struct IngredientInferencer {
    lexicon: IngredientLexicon,
}

impl IngredientInferencer {
    pub fn new(lexicon: IngredientLexicon) -> Self {
        IngredientInferencer { lexicon }
    }

    pub fn lexicon(&self) -> &IngredientLexicon {
        &self.lexicon
    }

    pub fn infer(&self, product: &Product) -> BTreeSet<String> {
        self.infer_text(&searchable_text(product))
    }

    pub fn infer_text(&self, text: &str) -> BTreeSet<String> {
        let text = text.to_lowercase();
        self.lexicon
            .iter()
            .filter(|(alias, _)| text.contains(alias))
            .map(|(_, canonical)| canonical.to_string())
            .collect()
    }
}

/// Categories then description, space separated
pub fn searchable_text(product: &Product) -> String {
    let mut text = product.categories.join(" ");
    if !product.description.is_empty() {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&product.description);
    }
    text.to_lowercase()
}
