//! First-seen tracking for app-data hashes.

use std::collections::HashMap;

use crate::models::{DedupedEntry, HashObservation, NO_APP_DATA_HASH};

/// Minimum block number per hash, built up one observation at a time.
#[derive(Debug, Default)]
pub struct FirstSeenIndex {
    first_seen: HashMap<String, u64>,
    sentinel_skipped: u64,
}

impl FirstSeenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sighting. The existing block is only replaced by a strictly smaller one.
    pub fn observe(&mut self, hash: &str, block_number: u64) {
        if hash == NO_APP_DATA_HASH {
            self.sentinel_skipped += 1;
            return;
        }

        match self.first_seen.get_mut(hash) {
            Some(existing) => {
                if block_number < *existing {
                    *existing = block_number;
                }
            }
            None => {
                self.first_seen.insert(hash.to_string(), block_number);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    /// Number of sentinel sightings that were dropped.
    pub fn sentinel_skipped(&self) -> u64 {
        self.sentinel_skipped
    }

    pub fn first_seen(&self, hash: &str) -> Option<u64> {
        self.first_seen.get(hash).copied()
    }

    /// Entries ordered by first-seen block, then hash.
    pub fn into_entries(self) -> Vec<DedupedEntry> {
        let mut entries: Vec<DedupedEntry> = self
            .first_seen
            .into_iter()
            .map(|(hash, first_seen_block)| DedupedEntry {
                hash,
                first_seen_block,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.first_seen_block
                .cmp(&b.first_seen_block)
                .then_with(|| a.hash.cmp(&b.hash))
        });
        entries
    }
}

/// Collapse observations to one entry per distinct, non-sentinel hash.
pub fn dedupe<'a, I>(observations: I) -> Vec<DedupedEntry>
where
    I: IntoIterator<Item = &'a HashObservation>,
{
    let mut index = FirstSeenIndex::new();
    for obs in observations {
        index.observe(&obs.hash, obs.block_number);
    }
    index.into_entries()
}
