//! Warehouse access: the settlement-call log on the read side and the
//! app-data table on the write side.
//!
//! The bundled backend is a SQLite file. Settlement rows store their trades
//! as a JSON array of packed trade strings; app-data rows store the nested
//! `content` record as JSON text.

use anyhow::{anyhow, bail, Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::{
    errors::LoadError,
    models::{AppDataContent, EnrichedRecord, TradeRecord},
};

pub const DEFAULT_SETTLEMENT_TABLE: &str = "settlement_calls";
pub const DEFAULT_APP_DATA_TABLE: &str = "raw_app_data";

/// Read and write operations the pipeline needs from the warehouse.
pub trait Warehouse: Send + Sync {
    /// Every settlement call row, optionally restricted to successful calls.
    fn settlement_calls(&self, success_only: bool) -> Result<Vec<TradeRecord>>;

    /// Drop the app-data table if present and create it empty.
    fn reset_app_data_table(&self) -> Result<()>;

    fn insert_app_data(&self, record: &EnrichedRecord) -> Result<(), LoadError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseTables {
    pub settlement: String,
    pub app_data: String,
}

impl WarehouseTables {
    pub fn new(settlement: &str, app_data: &str) -> Result<Self> {
        validate_table_name(settlement)?;
        validate_table_name(app_data)?;
        Ok(Self {
            settlement: settlement.to_string(),
            app_data: app_data.to_string(),
        })
    }
}

impl Default for WarehouseTables {
    fn default() -> Self {
        Self {
            settlement: DEFAULT_SETTLEMENT_TABLE.to_string(),
            app_data: DEFAULT_APP_DATA_TABLE.to_string(),
        }
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are allowed.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        bail!("table name must not be empty");
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        bail!("table name {:?} must start with a letter or underscore", name);
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("table name {:?} may only contain letters, digits and underscores", name);
    }
    Ok(())
}

pub struct SqliteWarehouse {
    conn: Mutex<Connection>,
    tables: WarehouseTables,
}

impl SqliteWarehouse {
    pub fn open(db_path: &str, tables: WarehouseTables) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open warehouse at {}", db_path))?;

        info!(
            path = %db_path,
            settlement_table = %tables.settlement,
            app_data_table = %tables.app_data,
            "📊 Warehouse opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            tables,
        })
    }

    pub fn tables(&self) -> &WarehouseTables {
        &self.tables
    }

    pub fn count_app_data(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let sql = format!("SELECT COUNT(*) FROM {}", self.tables.app_data);
        conn.query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows in {}", self.tables.app_data))
    }

    /// All app-data rows in insertion order.
    pub fn load_app_data(&self) -> Result<Vec<EnrichedRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT app_hash, content, first_seen_block FROM {} ORDER BY rowid",
            self.tables.app_data
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (app_hash, content_json, first_seen_block) = row?;
            let content: AppDataContent = serde_json::from_str(&content_json)
                .with_context(|| format!("Corrupt content column for {}", app_hash))?;
            records.push(EnrichedRecord {
                app_hash,
                content,
                first_seen_block: u64::try_from(first_seen_block)
                    .map_err(|_| anyhow!("negative first_seen_block {}", first_seen_block))?,
            });
        }
        Ok(records)
    }
}

impl Warehouse for SqliteWarehouse {
    fn settlement_calls(&self, success_only: bool) -> Result<Vec<TradeRecord>> {
        let conn = self.conn.lock();
        let mut sql = format!(
            "SELECT trades, call_block_number FROM {}",
            self.tables.settlement
        );
        if success_only {
            sql.push_str(" WHERE call_success = 1");
        }

        let mut stmt = conn
            .prepare(&sql)
            .with_context(|| format!("Failed to prepare settlement query on {}", self.tables.settlement))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let (trades_json, block) = row.context("Failed to read settlement row")?;

            let Ok(block_number) = u64::try_from(block) else {
                warn!(block, "Skipping settlement row with negative block number");
                skipped += 1;
                continue;
            };

            match serde_json::from_str::<Vec<String>>(&trades_json) {
                Ok(trades) => records.push(TradeRecord::new(trades, block_number)),
                Err(e) => {
                    warn!(block_number, error = %e, "Skipping settlement row with malformed trades");
                    skipped += 1;
                }
            }
        }

        debug!(rows = records.len(), skipped, success_only, "settlement query finished");
        Ok(records)
    }

    fn reset_app_data_table(&self) -> Result<()> {
        let conn = self.conn.lock();
        let table = &self.tables.app_data;
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} (
                 app_hash TEXT NOT NULL,
                 content TEXT NOT NULL,
                 first_seen_block INTEGER NOT NULL
             );"
        ))
        .with_context(|| format!("Failed to reset table {}", table))?;

        info!(table = %table, "App data table reset");
        Ok(())
    }

    fn insert_app_data(&self, record: &EnrichedRecord) -> Result<(), LoadError> {
        let load_error = |reason: String| LoadError {
            app_hash: record.app_hash.clone(),
            table: self.tables.app_data.clone(),
            reason,
        };

        let content = serde_json::to_string(&record.content).map_err(|e| load_error(e.to_string()))?;
        let first_seen_block = i64::try_from(record.first_seen_block)
            .map_err(|_| load_error(format!("block {} out of range", record.first_seen_block)))?;

        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (app_hash, content, first_seen_block) VALUES (?1, ?2, ?3)",
                self.tables.app_data
            ),
            params![record.app_hash, content, first_seen_block],
        )
        .map_err(|e| load_error(e.to_string()))?;

        Ok(())
    }
}
