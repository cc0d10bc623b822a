//! In-memory result store.
//!
//! Holds the reconciled records of the most recent finished cycle. The whole
//! table is published with a single pointer swap, so readers see either the
//! previous cycle or the new one, never a mix and never an empty window.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::metadata::CatalogRecord;
use crate::searcher::SearchCandidate;

/// A catalog record with its ranked candidates (best first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub record: CatalogRecord,
    /// Empty means the record was searched but nothing matched.
    pub candidates: Vec<SearchCandidate>,
}

impl ReconciledRecord {
    pub fn new(record: CatalogRecord, candidates: Vec<SearchCandidate>) -> Self {
        Self { record, candidates }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn has_matches(&self) -> bool {
        !self.candidates.is_empty()
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    records: Vec<Arc<ReconciledRecord>>,
    index: HashMap<String, usize>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn build(records: Vec<ReconciledRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        let mut stored: Vec<Arc<ReconciledRecord>> = Vec::with_capacity(records.len());

        for record in records {
            // A repeated id replaces the earlier entry in place.
            match index.get(record.id()) {
                Some(&pos) => stored[pos] = Arc::new(record),
                None => {
                    index.insert(record.id().to_string(), stored.len());
                    stored.push(Arc::new(record));
                }
            }
        }

        Self {
            records: stored,
            index,
            refreshed_at: Some(Utc::now()),
        }
    }
}

/// Keyed table of reconciled records, replaced wholesale once per cycle.
#[derive(Debug, Default)]
pub struct ResultStore {
    current: RwLock<Arc<Snapshot>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Look up one record by catalog id.
    pub async fn get(&self, id: &str) -> Option<Arc<ReconciledRecord>> {
        let snapshot = self.snapshot().await;
        snapshot
            .index
            .get(id)
            .map(|&pos| Arc::clone(&snapshot.records[pos]))
    }

    /// All records in the order the last cycle inserted them.
    pub async fn get_all(&self) -> Vec<Arc<ReconciledRecord>> {
        self.snapshot().await.records.clone()
    }

    /// Publish a complete new table, discarding the previous one.
    pub async fn replace_all(&self, records: Vec<ReconciledRecord>) {
        let snapshot = Arc::new(Snapshot::build(records));
        *self.current.write().await = snapshot;
    }

    pub async fn len(&self) -> usize {
        self.snapshot().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// When the current table was published. `None` before the first cycle.
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().await.refreshed_at
    }
}
