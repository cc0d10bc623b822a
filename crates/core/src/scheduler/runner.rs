//! Refresh scheduler implementation.
//!
//! Runs a cycle immediately on start and then once per interval. At most one
//! cycle is in flight: a tick or manual trigger that arrives while a cycle is
//! running is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Notify, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::metrics;
use crate::reconcile::{PipelineError, ReconciliationPipeline};

use super::types::{SchedulerState, SchedulerStats, SchedulerStatus, TriggerOutcome};

/// State shared between the scheduler handle and spawned cycle tasks.
struct Shared {
    pipeline: Arc<ReconciliationPipeline>,
    in_flight: AtomicBool,
    idle: Notify,
    stats: RwLock<SchedulerStats>,
}

/// Clears the in-flight flag when the cycle task ends, however it ends.
struct InFlightGuard {
    shared: Arc<Shared>,
}

impl InFlightGuard {
    fn acquire(shared: &Arc<Shared>) -> Option<Self> {
        shared
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                shared: Arc::clone(shared),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.shared.in_flight.store(false, Ordering::SeqCst);
        self.shared.idle.notify_waiters();
    }
}

/// Periodic driver for the reconciliation pipeline.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RefreshScheduler {
    pub fn new(pipeline: Arc<ReconciliationPipeline>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            shared: Arc::new(Shared {
                pipeline,
                in_flight: AtomicBool::new(false),
                idle: Notify::new(),
                stats: RwLock::new(SchedulerStats::default()),
            }),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the tick loop. The first tick fires immediately.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        info!(interval_secs = self.interval.as_secs(), "Starting refresh scheduler");

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let period = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        if Self::spawn_cycle(&shared) == TriggerOutcome::AlreadyRunning {
                            shared.stats.write().await.ticks_skipped += 1;
                            info!("Previous cycle still running, skipping tick");
                        }
                    }
                }
            }

            info!("Scheduler loop stopped");
        });
    }

    /// Stop ticking. A cycle in flight is left to finish.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping refresh scheduler");
        let _ = self.shutdown_tx.send(());
    }

    /// Run a cycle now unless one is already in flight.
    pub fn trigger(&self) -> TriggerOutcome {
        let outcome = Self::spawn_cycle(&self.shared);
        if outcome == TriggerOutcome::AlreadyRunning {
            info!("Manual refresh requested while a cycle is running");
        }
        outcome
    }

    /// Wait until no cycle is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if !self.shared.in_flight.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    pub fn is_cycle_running(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_ticking(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> SchedulerStatus {
        let stats = self.shared.stats.read().await.clone();
        SchedulerStatus {
            state: if self.is_cycle_running() {
                SchedulerState::Running
            } else {
                SchedulerState::Idle
            },
            ticking: self.is_ticking(),
            interval_secs: self.interval.as_secs(),
            cycles_run: stats.cycles_run,
            cycles_failed: stats.cycles_failed,
            ticks_skipped: stats.ticks_skipped,
            last_started_at: stats.last_started_at,
            last_report: stats.last_report,
            last_error: stats.last_error,
        }
    }

    /// Claim the in-flight flag and spawn one cycle.
    fn spawn_cycle(shared: &Arc<Shared>) -> TriggerOutcome {
        let Some(guard) = InFlightGuard::acquire(shared) else {
            return TriggerOutcome::AlreadyRunning;
        };

        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            let _guard = guard;
            shared.stats.write().await.last_started_at = Some(Utc::now());

            // The cycle gets its own task so a panic ends only that task.
            let pipeline = Arc::clone(&shared.pipeline);
            let result = match tokio::spawn(async move { pipeline.run_cycle().await }).await {
                Ok(result) => result,
                Err(e) => {
                    let err = PipelineError::Aborted(e.to_string());
                    metrics::CYCLES_TOTAL
                        .with_label_values(&[err.metric_label()])
                        .inc();
                    Err(err)
                }
            };

            let mut stats = shared.stats.write().await;
            stats.cycles_run += 1;
            match result {
                Ok(report) => {
                    stats.last_report = Some(report);
                    stats.last_error = None;
                }
                Err(e) => {
                    error!(error = %e, "Refresh cycle failed");
                    stats.cycles_failed += 1;
                    stats.last_error = Some(e.to_string());
                }
            }
        });

        TriggerOutcome::Started
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}
