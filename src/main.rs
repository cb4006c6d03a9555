use std::path::PathBuf;

use anyhow::Context;
use sales_analytics::config::AnalysisConfig;
use sales_analytics::logging::{init_logging, LoggingConfig};
use sales_analytics::services::csv_import_service;
use sales_analytics::{run_analysis, RecordSet};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let csv_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: sales-analytics <csv-path>")?;

    let config = AnalysisConfig::from_env()?;

    let rows = csv_import_service::read_csv_file(&csv_path)?;
    let record_set = RecordSet::load_with(rows, &config.load_options())
        .with_context(|| format!("Failed to load sales records from {:?}", csv_path))?;
    tracing::info!(
        "📊 Loaded {} records from {:?} ({} dropped)",
        record_set.row_count(),
        csv_path,
        record_set.dropped_row_count()
    );

    let report = run_analysis(&record_set, &config);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
