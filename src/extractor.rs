//! Settlement trade decoding.
//!
//! Each settlement call row carries its trades as comma-packed strings. The
//! app-data hash sits at a fixed position in that packing; everything else in
//! the string is ignored here.

use crate::models::{HashObservation, TradeRecord};

/// Position of the app-data hash within a packed trade string.
pub const APP_DATA_FIELD_INDEX: usize = 6;

/// Pull the app-data hash out of a single packed trade string.
///
/// Returns `None` when the string has too few fields or the field is blank.
pub fn app_data_hash(trade: &str) -> Option<&str> {
    let hash = trade.split(',').nth(APP_DATA_FIELD_INDEX)?.trim();
    if hash.is_empty() {
        return None;
    }
    Some(hash)
}

/// Flatten settlement rows into hash sightings, in row then trade order.
pub fn extract_observations<'a, I>(rows: I) -> Vec<HashObservation>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut observations = Vec::new();
    for row in rows {
        for trade in &row.trades {
            if let Some(hash) = app_data_hash(trade) {
                observations.push(HashObservation {
                    hash: hash.to_string(),
                    block_number: row.block_number,
                });
            }
        }
    }
    observations
}
