//! Reconciliation of catalog records against file search results.

mod pipeline;
mod types;

pub use pipeline::ReconciliationPipeline;
pub use types::{CycleReport, PipelineError, RecordOutcome};
