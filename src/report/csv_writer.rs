use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Writes report tables to CSV files
pub struct ReportWriter;

impl ReportWriter {
    pub fn write_csv(&self, df: &mut DataFrame, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
            }
        }

        let mut file =
            File::create(path).with_context(|| format!("Failed to create report file: {}", path))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .with_context(|| format!("Failed to write CSV report: {}", path))?;

        info!("✅ Saved {} rows to {}", df.height(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::report::ReportBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_writes_header_and_rows() {
        let products = vec![
            Product::new("Aloe Gel").with_price(7.5).with_categories(["Aloe Gels"]),
            Product::new("Snail Essence"),
        ];
        let mut df = ReportBuilder::new(None).raw_report(&products).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("raw.csv");
        ReportWriter.write_csv(&mut df, path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("product_id,name,brand,price"));
        assert!(lines[1].contains("Aloe Gel"));
        assert!(lines[2].contains("Snail Essence"));
    }

    #[test]
    fn test_empty_report_writes_header_only() {
        let mut df = ReportBuilder::new(None).grouped_report(&[]).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("grouped_empty.csv");
        ReportWriter.write_csv(&mut df, path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.trim_end(),
            "Key Ingredient,Product Rank,Product Name,Brand,Price (USD),Product Score"
        );
    }
}
