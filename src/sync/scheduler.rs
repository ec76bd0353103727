//! Single-flight periodic reconciliation over the tracked set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::SyncSettings;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::engine::{DiffNotifyEngine, ReconcileOutcome};

/// Counts gathered over one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items visited.
    pub tracked: usize,
    /// Items whose snapshot changed.
    pub changed: usize,
    /// Items skipped because of an error.
    pub failed: usize,
    /// Items dropped from tracking, merged ones included.
    pub pruned: usize,
    /// Wall-clock duration.
    pub elapsed: Duration,
    /// Whether the cycle overran the slow-cycle threshold.
    pub slow: bool,
}

/// Drives [`DiffNotifyEngine`] on a fixed interval.
///
/// At most one cycle runs at a time; a tick that fires while a cycle is
/// still running is dropped.
pub struct SyncScheduler {
    engine: Arc<DiffNotifyEngine>,
    settings: SyncSettings,
    telemetry: Arc<dyn TelemetrySink>,
    running: AtomicBool,
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SyncScheduler")
            .field("settings", &self.settings)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

pub(crate) struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new(
        engine: Arc<DiffNotifyEngine>,
        settings: SyncSettings,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            engine,
            settings,
            telemetry,
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn begin(&self) -> Option<CycleGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard(&self.running))
    }

    /// Runs one cycle now, or returns `None` when one is already running.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        let Some(_guard) = self.begin() else {
            tracing::debug!("reconciliation cycle still running, skipping tick");
            return None;
        };

        let started = Instant::now();
        let entries = self.engine.tracked().entries();
        let mut report = CycleReport {
            tracked: entries.len(),
            ..CycleReport::default()
        };

        for (position, entry) in entries.iter().enumerate() {
            if position > 0 && !self.settings.item_delay.is_zero() {
                time::sleep(self.settings.item_delay).await;
            }
            match self.engine.reconcile(entry).await {
                Ok(ReconcileOutcome::Unchanged) => {}
                Ok(ReconcileOutcome::Updated) => report.changed += 1,
                Ok(ReconcileOutcome::Merged) => {
                    report.changed += 1;
                    report.pruned += 1;
                }
                Ok(ReconcileOutcome::Pruned) => report.pruned += 1,
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!(
                        reference = %entry.reference,
                        thread = %entry.thread,
                        %error,
                        "failed to reconcile pull request"
                    );
                }
            }
        }

        report.elapsed = started.elapsed();
        report.slow = report.elapsed > self.settings.slow_cycle_threshold;
        if report.slow {
            tracing::warn!(
                elapsed_secs = report.elapsed.as_secs(),
                tracked = report.tracked,
                "reconciliation cycle was slow"
            );
        }
        self.telemetry
            .record(TelemetryEvent::ReconciliationCycleCompleted {
                tracked: report.tracked,
                changed: report.changed,
                failed: report.failed,
                pruned: report.pruned,
                elapsed_millis: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            });
        Some(report)
    }

    /// Spawns the periodic loop on the current runtime.
    ///
    /// Each tick starts its cycle in its own task so a long cycle never
    /// delays the next tick; overlapping ticks are dropped by
    /// [`Self::run_cycle`].
    #[must_use]
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            time::sleep(self.settings.initial_delay).await;
            let mut interval = time::interval(self.settings.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    scheduler.run_cycle().await;
                });
            }
        })
    }
}
