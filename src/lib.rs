//! App-data backfill library
//!
//! Reads settlement calls from the warehouse, resolves the app-data hash of
//! every trade against the metadata API, and loads the results back into a
//! warehouse table. The binary in `main.rs` wires these pieces from config.

pub mod app_data_api;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod warehouse;

pub use app_data_api::{AppDataApiClient, AppDataSource};
pub use pipeline::{Pipeline, PipelineOptions, RunSummary};
pub use warehouse::{SqliteWarehouse, Warehouse, WarehouseTables};
