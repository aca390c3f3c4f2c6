//! Extract → dedupe → enrich → load, one hash at a time.
//!
//! Setup failures (reset, settlement query) abort the run. Per-hash failures
//! are logged, counted by kind, and skipped.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    app_data_api::AppDataSource,
    dedup::FirstSeenIndex,
    errors::{EnrichError, FailureKind, LoadError},
    extractor::extract_observations,
    models::{DedupedEntry, EnrichedRecord},
    warehouse::Warehouse,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Only read settlement calls flagged as successful.
    pub success_only: bool,
    /// Drop and re-create the app-data table before loading.
    pub reset_table: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub network: u64,
    pub status: u64,
    pub envelope_parse: u64,
    pub document_parse: u64,
    pub insert: u64,
}

impl FailureCounts {
    pub fn record(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::Network => self.network += 1,
            FailureKind::Status => self.status += 1,
            FailureKind::EnvelopeParse => self.envelope_parse += 1,
            FailureKind::DocumentParse => self.document_parse += 1,
            FailureKind::Insert => self.insert += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.network + self.status + self.envelope_parse + self.document_parse + self.insert
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub table_reset: bool,
    pub settlement_rows: usize,
    pub observations: usize,
    pub sentinel_skipped: u64,
    pub distinct_hashes: usize,
    pub fetched: u64,
    pub inserted: u64,
    pub failures: FailureCounts,
}

/// Output of the extract and dedupe stages.
#[derive(Debug, Clone)]
pub struct ExtractedHashes {
    pub settlement_rows: usize,
    pub observations: usize,
    pub sentinel_skipped: u64,
    pub entries: Vec<DedupedEntry>,
}

pub struct Pipeline<W, S> {
    warehouse: W,
    source: S,
    options: PipelineOptions,
}

impl<W: Warehouse, S: AppDataSource> Pipeline<W, S> {
    pub fn new(warehouse: W, source: S, options: PipelineOptions) -> Self {
        Self {
            warehouse,
            source,
            options,
        }
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    pub fn extract(&self) -> Result<ExtractedHashes> {
        let rows = self
            .warehouse
            .settlement_calls(self.options.success_only)
            .context("Failed to query settlement calls")?;

        let observations = extract_observations(&rows);
        let mut index = FirstSeenIndex::new();
        for obs in &observations {
            index.observe(&obs.hash, obs.block_number);
        }

        let extracted = ExtractedHashes {
            settlement_rows: rows.len(),
            observations: observations.len(),
            sentinel_skipped: index.sentinel_skipped(),
            entries: index.into_entries(),
        };

        info!(
            settlement_rows = extracted.settlement_rows,
            observations = extracted.observations,
            sentinel_skipped = extracted.sentinel_skipped,
            distinct_hashes = extracted.entries.len(),
            "🔎 App data hashes extracted"
        );

        Ok(extracted)
    }

    pub async fn enrich(&self, entry: &DedupedEntry) -> Result<EnrichedRecord, EnrichError> {
        let content = self.source.fetch_app_data(&entry.hash).await?;
        Ok(EnrichedRecord {
            app_hash: entry.hash.clone(),
            content,
            first_seen_block: entry.first_seen_block,
        })
    }

    pub fn load(&self, record: &EnrichedRecord) -> Result<(), LoadError> {
        self.warehouse.insert_app_data(record)
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();

        if self.options.reset_table {
            self.warehouse
                .reset_app_data_table()
                .context("Failed to reset app data table")?;
        }

        let extracted = self.extract()?;
        let mut fetched = 0u64;
        let mut inserted = 0u64;
        let mut failures = FailureCounts::default();

        for entry in &extracted.entries {
            let record = match self.enrich(entry).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        hash = %entry.hash,
                        kind = e.kind().as_str(),
                        error = %e,
                        "Failed to fetch app data"
                    );
                    failures.record(e.kind());
                    continue;
                }
            };
            fetched += 1;

            match self.load(&record) {
                Ok(()) => {
                    inserted += 1;
                    debug!(
                        hash = %record.app_hash,
                        first_seen_block = record.first_seen_block,
                        app_code = %record.content.app_code,
                        "Row inserted"
                    );
                }
                Err(e) => {
                    warn!(hash = %record.app_hash, error = %e, "Failed to insert app data row");
                    failures.record(FailureKind::Insert);
                }
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            table_reset: self.options.reset_table,
            settlement_rows: extracted.settlement_rows,
            observations: extracted.observations,
            sentinel_skipped: extracted.sentinel_skipped,
            distinct_hashes: extracted.entries.len(),
            fetched,
            inserted,
            failures,
        };

        info!(
            distinct_hashes = summary.distinct_hashes,
            inserted = summary.inserted,
            failed = summary.failures.total(),
            "✅ Backfill finished"
        );

        Ok(summary)
    }
}
