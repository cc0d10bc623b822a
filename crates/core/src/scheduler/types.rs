//! Types for the refresh scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reconcile::CycleReport;

/// Whether a cycle is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Result of asking the scheduler to run a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// A new cycle was spawned.
    Started,
    /// A cycle is already in flight; the request was dropped.
    AlreadyRunning,
}

impl TriggerOutcome {
    pub fn started(&self) -> bool {
        matches!(self, TriggerOutcome::Started)
    }
}

/// Counters kept across cycles.
#[derive(Debug, Clone, Default)]
pub(crate) struct SchedulerStats {
    pub cycles_run: u64,
    pub cycles_failed: u64,
    pub ticks_skipped: u64,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
    pub last_error: Option<String>,
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    /// Whether the periodic tick loop is active.
    pub ticking: bool,
    pub interval_secs: u64,
    /// Cycles that ran to completion, successful or not.
    pub cycles_run: u64,
    pub cycles_failed: u64,
    /// Scheduled ticks dropped because a cycle was in flight.
    pub ticks_skipped: u64,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
    pub last_error: Option<String>,
}
