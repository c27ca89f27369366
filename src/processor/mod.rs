pub mod ingredient_grouper;
pub mod ingredient_inferencer;
pub mod product_extractor;
pub mod product_scorer;

pub use ingredient_grouper::*;
pub use ingredient_inferencer::*;
pub use product_extractor::*;
pub use product_scorer::*;
