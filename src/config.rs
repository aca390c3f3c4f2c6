use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use crate::{
    app_data_api::DEFAULT_APP_DATA_API_BASE,
    pipeline::PipelineOptions,
    warehouse::{WarehouseTables, DEFAULT_APP_DATA_TABLE, DEFAULT_SETTLEMENT_TABLE},
};

/// Backfill configuration. Every flag can also come from the environment or a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(name = "app-data-backfill")]
#[command(about = "Resolve settlement app-data hashes and load them into the warehouse")]
pub struct PipelineConfig {
    /// Path of the SQLite warehouse file
    #[arg(long, env = "APP_DATA_WAREHOUSE_PATH", default_value = "./warehouse.db")]
    pub warehouse_path: String,

    /// Settlement call log table
    #[arg(long, env = "APP_DATA_SETTLEMENT_TABLE", default_value = DEFAULT_SETTLEMENT_TABLE)]
    pub settlement_table: String,

    /// Destination table for resolved app data
    #[arg(long, env = "APP_DATA_TABLE", default_value = DEFAULT_APP_DATA_TABLE)]
    pub app_data_table: String,

    /// Base URL of the app-data endpoint; the hash is appended as the last path segment
    #[arg(long, env = "APP_DATA_API_BASE", default_value = DEFAULT_APP_DATA_API_BASE)]
    pub api_base: String,

    /// Only read settlement calls that succeeded
    #[arg(long, env = "APP_DATA_SUCCESS_ONLY")]
    pub success_only: bool,

    /// Keep existing rows instead of dropping and re-creating the destination table
    #[arg(long, env = "APP_DATA_SKIP_RESET")]
    pub skip_reset: bool,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "APP_DATA_HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,
}

impl PipelineConfig {
    pub fn tables(&self) -> Result<WarehouseTables> {
        WarehouseTables::new(&self.settlement_table, &self.app_data_table)
    }

    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            success_only: self.success_only,
            reset_table: !self.skip_reset,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}
