//! Mock catalog source for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::{CatalogRecord, CatalogSource};

/// Mock implementation of the CatalogSource trait.
///
/// Returns the configured records, truncated to the requested count.
#[derive(Debug, Default)]
pub struct MockCatalogSource {
    records: Arc<RwLock<Vec<CatalogRecord>>>,
    fetch_count: AtomicUsize,
}

impl MockCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock with predefined records.
    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Replace the records returned by subsequent fetches.
    pub async fn set_records(&self, records: Vec<CatalogRecord>) {
        *self.records.write().await = records;
    }

    /// Number of fetches performed.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_trending(&self, target_count: usize) -> Vec<CatalogRecord> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.records
            .read()
            .await
            .iter()
            .take(target_count)
            .cloned()
            .collect()
    }
}
