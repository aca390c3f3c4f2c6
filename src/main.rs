//! App-data backfill
//!
//! Usage:
//!   app-data-backfill --warehouse-path ./warehouse.db [--success-only] [--skip-reset]
//!
//! Environment (or `.env`):
//!   APP_DATA_WAREHOUSE_PATH - SQLite warehouse file (default: ./warehouse.db)
//!   APP_DATA_SETTLEMENT_TABLE - Settlement call log table (default: settlement_calls)
//!   APP_DATA_TABLE - Destination table (default: raw_app_data)
//!   APP_DATA_API_BASE - App-data endpoint base URL
//!   APP_DATA_SUCCESS_ONLY - Only read successful settlement calls
//!   APP_DATA_SKIP_RESET - Do not drop and re-create the destination table
//!   APP_DATA_HTTP_TIMEOUT_SECS - Per-request timeout (default: 30)

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_data_backfill::{
    config::PipelineConfig, AppDataApiClient, Pipeline, SqliteWarehouse,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = PipelineConfig::parse();
    let tables = config.tables()?;
    let options = config.options();

    info!(
        warehouse = %config.warehouse_path,
        api_base = %config.api_base,
        success_only = options.success_only,
        reset_table = options.reset_table,
        "Starting app data backfill"
    );

    let warehouse = SqliteWarehouse::open(&config.warehouse_path, tables)?;
    let source = AppDataApiClient::new(&config.api_base, config.http_timeout())?;

    let summary = Pipeline::new(warehouse, source, options).run().await?;

    let summary_json =
        serde_json::to_string(&summary).context("Failed to serialize run summary")?;
    info!(summary = %summary_json, "Run summary");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app_data_backfill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
