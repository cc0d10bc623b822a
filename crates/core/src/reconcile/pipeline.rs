//! Reconciliation pipeline.
//!
//! One cycle: fetch the trending catalog, search every record sequentially,
//! filter and rank the rows, then publish the whole table to the store in a
//! single swap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::credentials::OperatorCredentials;
use crate::matching::{filter_candidates, rank_by_resolution};
use crate::metadata::{build_search_key, format_date_parts, CatalogRecord, CatalogSource};
use crate::metrics;
use crate::searcher::decode::{decode_url_prefix, to_candidate};
use crate::searcher::FileSearch;
use crate::store::{ReconciledRecord, ResultStore};

use super::types::{CycleReport, PipelineError, RecordOutcome};

/// Drives catalog records through search and matching into the store.
pub struct ReconciliationPipeline {
    catalog: Arc<dyn CatalogSource>,
    search: Arc<dyn FileSearch>,
    credentials: OperatorCredentials,
    store: Arc<ResultStore>,
    target_count: usize,
    record_delay: Duration,
}

impl ReconciliationPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        search: Arc<dyn FileSearch>,
        credentials: OperatorCredentials,
        store: Arc<ResultStore>,
        config: &RefreshConfig,
    ) -> Self {
        Self {
            catalog,
            search,
            credentials,
            store,
            target_count: config.target_count,
            record_delay: Duration::from_millis(config.record_delay_ms),
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Run one full cycle and publish its result.
    ///
    /// Per-record failures only reduce the yield. The store is untouched
    /// unless the cycle finishes.
    pub async fn run_cycle(&self) -> Result<CycleReport, PipelineError> {
        let start = Instant::now();
        info!(
            catalog = self.catalog.name(),
            search = self.search.name(),
            target_count = self.target_count,
            "Starting refresh cycle"
        );

        let records = self.catalog.fetch_trending(self.target_count).await;
        if records.is_empty() {
            let err = PipelineError::EmptyCatalog;
            warn!("Catalog fetch returned no records, keeping previous results");
            metrics::CYCLES_TOTAL
                .with_label_values(&[err.metric_label()])
                .inc();
            return Err(err);
        }

        let mut report = CycleReport {
            fetched: records.len(),
            ..Default::default()
        };
        let mut staged = Vec::with_capacity(records.len());
        let mut searched_any = false;

        for record in records {
            let outcome = match build_search_key(&record) {
                None => RecordOutcome::Unsearchable,
                Some(key) => {
                    if searched_any && !self.record_delay.is_zero() {
                        tokio::time::sleep(self.record_delay).await;
                    }
                    searched_any = true;
                    self.reconcile_record(&record, &key).await
                }
            };

            report.count(&outcome);
            metrics::RECORDS_PROCESSED
                .with_label_values(&[outcome.metric_label()])
                .inc();

            match outcome {
                RecordOutcome::Unsearchable => {
                    debug!(id = %record.id, title = %record.title, "Record has no search key, skipping");
                }
                RecordOutcome::SearchFailed => {}
                RecordOutcome::Reconciled(candidates) => {
                    metrics::CANDIDATES_PER_RECORD.observe(candidates.len() as f64);
                    staged.push(ReconciledRecord::new(record, candidates));
                }
            }
        }

        report.stored = staged.len();
        self.store.replace_all(staged).await;

        let elapsed = start.elapsed();
        report.duration_ms = elapsed.as_millis() as u64;
        report.finished_at = Some(Utc::now());

        metrics::CYCLES_TOTAL.with_label_values(&["completed"]).inc();
        metrics::CYCLE_DURATION
            .with_label_values(&["completed"])
            .observe(elapsed.as_secs_f64());

        info!(
            fetched = report.fetched,
            matched = report.matched,
            no_match = report.no_match,
            unsearchable = report.unsearchable,
            search_failed = report.search_failed,
            stored = report.stored,
            duration_ms = report.duration_ms,
            "Refresh cycle complete"
        );

        Ok(report)
    }

    /// Search one record and turn the surviving rows into candidates.
    async fn reconcile_record(&self, record: &CatalogRecord, key: &str) -> RecordOutcome {
        // A search key implies a release date.
        let Some(date) = format_date_parts(record.release_date) else {
            return RecordOutcome::Unsearchable;
        };

        let Some(response) = self.search.search(&self.credentials, key).await else {
            return RecordOutcome::SearchFailed;
        };

        let prefix = decode_url_prefix(&response);
        let total = response.rows().len();
        let filtered = filter_candidates(response.into_rows(), &date, record.duration_secs);
        let ranked = rank_by_resolution(filtered);
        let candidates: Vec<_> = ranked.iter().map(|row| to_candidate(&prefix, row)).collect();

        debug!(
            id = %record.id,
            query = key,
            results = total,
            kept = candidates.len(),
            "Record reconciled"
        );

        RecordOutcome::Reconciled(candidates)
    }
}
