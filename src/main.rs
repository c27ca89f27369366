use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{IngredientLexicon, ScraperConfig};
use crate::fetcher::{ApiFetcher, FallbackSource, ProductSource, acquire_products};
use crate::processor::{
    IngredientGrouper, IngredientInferencer, ProductExtractor, ProductScorer, largest_groups,
};
use crate::report::{ReportBuilder, ReportWriter};

mod config;
mod fetcher;
mod models;
mod processor;
mod report;

const DEFAULT_CONFIG_PATH: &str = "src/configs/snapklik.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Parse command line
    let fallback_only = env::args().any(|arg| arg == "--fallback-only" || arg == "-f");
    let config_path = env::args()
        .skip(1)
        .find(|arg| !arg.starts_with('-'))
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    if !Path::new(&config_path).exists() {
        warn!("Config file not found: {}, using built-in defaults", config_path);
    }

    // Load configuration
    let config = ScraperConfig::load(&config_path)?;
    config.validate().context("Invalid scraper configuration")?;

    if fallback_only {
        info!("🚀 Starting skincare pipeline for {} (fallback document only)", config.api.name);
    } else {
        info!("🚀 Starting skincare pipeline for {}", config.api.name);
    }

    // Load ingredient aliases
    let lexicon = match &config.lexicon_path {
        Some(path) => IngredientLexicon::from_file(path)
            .with_context(|| format!("Failed to load ingredient lexicon from {}", path))?,
        None => IngredientLexicon::default(),
    };
    info!("Loaded ingredient lexicon with {} aliases", lexicon.len());

    match run(&config, lexicon, fallback_only).await {
        Ok(()) => {
            info!("🎉 Skincare pipeline completed successfully!");
            Ok(())
        }
        Err(e) => {
            error!("❌ Skincare pipeline failed: {:#}", e);
            Err(e)
        }
    }
}

async fn run(config: &ScraperConfig, lexicon: IngredientLexicon, fallback_only: bool) -> Result<()> {
    // Acquire raw hits
    let api_fetcher = ApiFetcher::new(config.api.clone(), config.pagination.clone())?;
    let fallback = FallbackSource::new(&config.fallback)?;

    // API first unless only the saved document is wanted
    let mut sources: Vec<&dyn ProductSource> = Vec::new();
    if !fallback_only {
        sources.push(&api_fetcher);
    }
    if config.fallback.enabled || fallback_only {
        sources.push(&fallback);
    }

    let acquired = acquire_products(&sources).await?;
    info!("Acquired {} raw hits from {}", acquired.hits.len(), acquired.source);

    // Normalize
    let extractor = ProductExtractor::new(config.api.clone())?;
    let products = extractor.extract_all(&acquired.hits);
    if products.is_empty() {
        warn!("⚠️ No products could be extracted, reports will only contain headers");
    }

    // Save raw products
    let builder = ReportBuilder::new(config.output.top_per_ingredient);
    let writer = ReportWriter;

    let mut raw_df = builder.raw_report(&products)?;
    writer.write_csv(&mut raw_df, &config.output.raw_csv_path)?;

    // Group and rank
    let inferencer = IngredientInferencer::new(lexicon);
    info!(
        "Matching against {} canonical ingredients",
        inferencer.lexicon().canonical_names().len()
    );
    let grouper = IngredientGrouper::new(inferencer, ProductScorer::new(config.scoring.clone()));
    let groups = grouper.group_and_rank(&products);

    // Save ranked groups
    let mut grouped_df = builder.grouped_report(&groups)?;
    writer.write_csv(&mut grouped_df, &config.output.grouped_csv_path)?;

    // Summary
    info!("\n=== Skincare Pipeline Summary ===");
    info!("📊 Products scraped: {}", products.len());
    info!("🧪 Ingredient groups: {}", groups.len());
    info!("📄 Grouped rows written: {}", grouped_df.height());
    for (ingredient, count) in largest_groups(&groups, 5) {
        info!("  {}: {} products", ingredient, count);
    }

    Ok(())
}
