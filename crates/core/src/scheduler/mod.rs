//! Refresh scheduler.
//!
//! Drives the reconciliation pipeline on a fixed interval:
//! - **Startup**: one cycle immediately
//! - **Ticks**: one cycle per interval, dropped if the previous one is still running
//! - **Manual**: `trigger()` uses the same overlap guard as ticks

mod runner;
mod types;

pub use runner::RefreshScheduler;
pub use types::{SchedulerState, SchedulerStatus, TriggerOutcome};
