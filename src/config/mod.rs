pub mod ingredient_lexicon;
pub mod scraper_config;

pub use ingredient_lexicon::IngredientLexicon;
pub use scraper_config::*;
